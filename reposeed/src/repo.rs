use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::utils::{bytes_from_hex, bytes_to_hex};

/// Number of flat fields emitted for every repository
pub const FIELDS_PER_RECORD: usize = 8;

/// Number of fields a repository takes up in a repo list XML file, the
/// priority is never part of the input
pub const INPUT_FIELDS_PER_RECORD: usize = FIELDS_PER_RECORD - 1;

/// Position of the assigned priority in a flat record
pub const PRIORITY_INDEX: usize = 7;

/// What to do with push requests sent by a repository's index
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushRequests {
    #[default]
    Ignore,
    Prompt,
    Always,
}

impl PushRequests {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Prompt => "prompt",
            Self::Always => "always",
        }
    }
}

impl Display for PushRequests {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PushRequests {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "prompt" => Ok(Self::Prompt),
            "always" => Ok(Self::Always),
            _ => Err(RecordError::InvalidPushRequests(s.into())),
        }
    }
}

/// Reasons a single group of input fields isn't a usable repository
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RecordError {
    #[error("wrong number of fields for a repository: {0}")]
    WrongWidth(usize),
    #[error("repository name is empty")]
    EmptyName,
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    #[error("invalid version `{0}`")]
    InvalidVersion(String),
    #[error("invalid enabled flag `{0}` (expected 0 or 1)")]
    InvalidEnabled(String),
    #[error("unknown push requests policy `{0}`")]
    InvalidPushRequests(String),
    #[error("pubkey is not a hex encoded certificate")]
    InvalidPubkey,
}

/// Why a whole list of harvested items was discarded
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Rejection {
    #[error("wrong number of items: {0}")]
    WrongItemCount(usize),
    #[error("repository #{0}: {1}")]
    InvalidRecord(usize, RecordError),
}

/// A single repository to be seeded into the database
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    pub name: String,
    pub address: String,
    pub description: String,
    pub version: u32,
    pub enabled: bool,
    pub push_requests: PushRequests,
    pub pubkey: String,
    pub priority: u32,
}

fn parse_enabled(raw: &str) -> Result<bool, RecordError> {
    match raw {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(RecordError::InvalidEnabled(raw.into())),
    }
}

impl RepoRecord {
    /// Build a record from the fields of one repository in a repo list
    ///
    /// The fields are expected in order: name, address, description, version,
    /// enabled, push requests, pubkey. The priority is left at 0.
    pub fn from_input_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, RecordError> {
        let [name, address, description, version, enabled, push_requests, pubkey] = fields else {
            return Err(RecordError::WrongWidth(fields.len()));
        };

        let name = name.as_ref();
        if name.is_empty() {
            return Err(RecordError::EmptyName);
        }

        let address = address.as_ref();
        if Url::parse(address).is_err() {
            return Err(RecordError::InvalidAddress(address.into()));
        }

        let version = version
            .as_ref()
            .parse::<u32>()
            .map_err(|_| RecordError::InvalidVersion(version.as_ref().into()))?;

        let pubkey = pubkey.as_ref();
        if bytes_from_hex(pubkey).is_none() {
            return Err(RecordError::InvalidPubkey);
        }

        Ok(Self {
            name: name.into(),
            address: address.into(),
            description: description.as_ref().into(),
            version,
            enabled: parse_enabled(enabled.as_ref())?,
            push_requests: push_requests.as_ref().parse()?,
            pubkey: pubkey.into(),
            priority: 0,
        })
    }

    /// The flat representation handed to the database layer
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.address.clone(),
            self.description.clone(),
            self.version.to_string(),
            String::from(if self.enabled { "1" } else { "0" }),
            self.push_requests.as_str().into(),
            self.pubkey.clone(),
            self.priority.to_string(),
        ]
    }

    /// SHA-256 fingerprint of the signing certificate, `None` if the repo
    /// has no pubkey
    pub fn fingerprint(&self) -> Option<String> {
        let cert = bytes_from_hex(&self.pubkey)?;
        if cert.is_empty() {
            return None;
        }
        Some(bytes_to_hex(&Sha256::digest(&cert)))
    }
}

impl Display for RepoRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Group harvested items into validated records
///
/// Every repository must contribute exactly [INPUT_FIELDS_PER_RECORD] items. Old
/// lists that still carry an explicit priority column have one item too many per
/// repository and are rejected here, either by the count or, when the count happens
/// to line up, by the field validation of the misaligned groups.
pub fn records_from_items(items: Vec<String>) -> Result<Vec<RepoRecord>, Rejection> {
    if items.len() % INPUT_FIELDS_PER_RECORD != 0 {
        return Err(Rejection::WrongItemCount(items.len()));
    }

    items
        .chunks_exact(INPUT_FIELDS_PER_RECORD)
        .enumerate()
        .map(|(idx, group)| {
            RepoRecord::from_input_fields(group).map_err(|e| Rejection::InvalidRecord(idx, e))
        })
        .collect()
}

/// Assign sequential priorities starting at `base`
///
/// Returns `None` if the last priority doesn't fit in a `u32`, the records are
/// left partially numbered in that case.
pub fn assign_priorities(records: &mut [RepoRecord], base: u32) -> Option<()> {
    for (idx, record) in records.iter_mut().enumerate() {
        record.priority = u32::try_from(idx)
            .ok()
            .and_then(|idx| base.checked_add(idx))?;
    }
    Some(())
}

/// Flatten records into [FIELDS_PER_RECORD] strings each
pub fn flatten(records: &[RepoRecord]) -> Vec<String> {
    let mut fields = Vec::with_capacity(records.len() * FIELDS_PER_RECORD);
    for r in records {
        fields.extend(r.to_fields());
    }
    fields
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    fn oem0() -> Vec<String> {
        [
            "oem0Name",
            "https://www.oem0.com/yeah/repo",
            "I'm the first oem repo.",
            "22",
            "1",
            "ignore",
            "fffff2313aaaaabcccc111",
        ]
        .iter()
        .map(|it| String::from(*it))
        .collect()
    }

    #[test]
    fn test_from_input_fields() {
        let rec = RepoRecord::from_input_fields(&oem0()).expect("valid record");
        assert_eq!(rec.name, "oem0Name");
        assert_eq!(rec.version, 22);
        assert!(rec.enabled);
        assert_eq!(rec.push_requests, PushRequests::Ignore);
        assert_eq!(rec.priority, 0);

        let fields = rec.to_fields();
        assert_eq!(fields.len(), FIELDS_PER_RECORD);
        assert_eq!(fields[PRIORITY_INDEX], "0");
        assert_eq!(&fields[..INPUT_FIELDS_PER_RECORD], oem0().as_slice());
    }

    #[rstest]
    #[case(0, "", RecordError::EmptyName)]
    #[case(1, "not a url", RecordError::InvalidAddress("not a url".into()))]
    #[case(3, "twenty", RecordError::InvalidVersion("twenty".into()))]
    #[case(4, "true", RecordError::InvalidEnabled("true".into()))]
    #[case(5, "sometimes", RecordError::InvalidPushRequests("sometimes".into()))]
    #[case(6, "xyz1", RecordError::InvalidPubkey)]
    fn test_invalid_field(#[case] idx: usize, #[case] value: &str, #[case] expected: RecordError) {
        let mut fields = oem0();
        fields[idx] = value.into();
        assert_eq!(RepoRecord::from_input_fields(&fields), Err(expected));
    }

    #[test]
    fn test_wrong_width() {
        let fields = oem0();
        assert_eq!(
            RepoRecord::from_input_fields(&fields[..6]),
            Err(RecordError::WrongWidth(6))
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn test_records_from_items(#[case] count: usize) {
        let items: Vec<String> = (0..count).flat_map(|_| oem0()).collect();
        let records = records_from_items(items).expect("valid items");
        assert_eq!(records.len(), count);
    }

    #[test]
    fn test_records_from_items_wrong_count() {
        let mut items = oem0();
        items.push("extra".into());
        assert_eq!(
            records_from_items(items),
            Err(Rejection::WrongItemCount(8))
        );
    }

    #[test]
    fn test_old_layout_rejected_when_count_lines_up() {
        // Seven repositories with a priority column is 56 items, which is also
        // a multiple of the current width
        let mut items = Vec::new();
        for _ in 0..7 {
            let mut old = oem0();
            old.insert(5, String::from("1"));
            items.extend(old);
        }
        assert_eq!(items.len() % INPUT_FIELDS_PER_RECORD, 0);
        assert!(matches!(
            records_from_items(items),
            Err(Rejection::InvalidRecord(_, _))
        ));
    }

    #[test]
    fn test_assign_priorities_and_flatten() {
        let items: Vec<String> = (0..3).flat_map(|_| oem0()).collect();
        let mut records = records_from_items(items).expect("valid items");
        assign_priorities(&mut records, 1).expect("priorities fit");
        let flat = flatten(&records);
        assert_eq!(flat.len(), 3 * FIELDS_PER_RECORD);
        let priorities: Vec<&str> = flat
            .iter()
            .skip(PRIORITY_INDEX)
            .step_by(FIELDS_PER_RECORD)
            .map(|it| it.as_str())
            .collect();
        assert_eq!(priorities, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_fingerprint() {
        let mut rec = RepoRecord::from_input_fields(&oem0()).expect("valid record");
        let fp = rec.fingerprint().expect("has a pubkey");
        assert_eq!(fp.len(), 64);
        rec.pubkey = String::new();
        assert_eq!(rec.fingerprint(), None);
    }

    #[test]
    fn test_json() {
        let rec = RepoRecord::from_input_fields(&oem0()).expect("valid record");
        let json = serde_json::to_value(&rec).expect("serializing");
        assert_eq!(json["push_requests"], "ignore");
        assert_eq!(json["enabled"], true);
        let back: RepoRecord = serde_json::from_value(json).expect("deserializing");
        assert_eq!(back, rec);
    }

    #[rstest]
    #[case(u32::MAX, 1, true)]
    #[case(u32::MAX, 2, false)]
    #[case(u32::MAX - 2, 3, true)]
    #[case(u32::MAX - 2, 4, false)]
    fn test_assign_priorities_overflow(
        #[case] base: u32,
        #[case] count: usize,
        #[case] fits: bool,
    ) {
        let items: Vec<String> = (0..count).flat_map(|_| oem0()).collect();
        let mut records = records_from_items(items).expect("valid items");
        assert_eq!(assign_priorities(&mut records, base).is_some(), fits);
        assert_eq!(records[0].priority, base);
    }

    #[test]
    fn test_push_requests_default() {
        assert_eq!(PushRequests::default(), PushRequests::Ignore);
    }
}
