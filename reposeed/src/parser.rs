//! Parsing of repo lists stored as Android string-array resources
//!
//! A repo list looks like
//!
//! ```xml
//! <resources>
//!     <string-array name="additional_repos">
//!         <!-- name -->
//!         <item>Some Repo</item>
//!         <!-- address -->
//!         <item>https://example.com/repo</item>
//!         ...
//!     </string-array>
//! </resources>
//! ```
//!
//! with a flat run of `<item>`s, [INPUT_FIELDS_PER_RECORD] per repository.
//!
//! [INPUT_FIELDS_PER_RECORD]: crate::repo::INPUT_FIELDS_PER_RECORD

use std::borrow::Cow;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::repo::{flatten, records_from_items, RepoRecord};
use crate::utils::{open_file, path_lossy};

pub const STRING_ARRAY_TAG: &str = "string-array";
pub const ITEM_TAG: &str = "item";

/// Container name of the repo list shipped with the application
pub const BUNDLED_CONTAINER: &str = "default_repos";

/// Container name of repo lists provided by the device vendor
pub const OEM_CONTAINER: &str = "additional_repos";

pub type ParseResult<T> = Result<T, ParseError>;

/// Structural problems with a repo list
///
/// These are hard failures, unlike a list with the wrong number of items which
/// is just treated as empty.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },
    #[error("no <string-array> in document")]
    MissingContainer,
    #[error("<item> at byte {0} is not inside a <string-array>")]
    ItemOutsideContainer(u64),
    #[error("<item> at byte {0} opened inside another <item>")]
    NestedItem(u64),
    #[error("unexpected <{tag}> at byte {position} inside <{parent}>")]
    UnexpectedTag {
        tag: String,
        parent: &'static str,
        position: u64,
    },
    #[error("document ended inside <{0}>")]
    UnexpectedEof(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Token {
    /// An opening tag, `array_name` holds the `name` attribute if there is one
    Open {
        name: String,
        array_name: Option<String>,
    },
    Close {
        name: String,
    },
    Text(String),
    Eof,
}

fn tag_name(bs: &BytesStart) -> String {
    String::from_utf8_lossy(bs.local_name().as_ref()).into_owned()
}

fn get_attribute_value(bs: &BytesStart, name: &str) -> Option<String> {
    for e in bs.attributes() {
        let att = match e {
            Ok(v) => v,
            Err(_) => continue,
        };

        if String::from_utf8_lossy(att.key.local_name().as_ref()) == name {
            return match String::from_utf8_lossy(&att.value) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(s) => Some(String::from(s)),
            };
        }
    }
    None
}

/// Pull tokenizer over an XML document
///
/// Comments, declarations and processing instructions never show up as tokens.
/// Text is reported untrimmed. `<foo/>` is reported as an [Token::Open]
/// immediately followed by a [Token::Close].
pub struct Scanner<R: BufRead> {
    xml: Reader<R>,
    buf: Vec<u8>,
    pending_close: Option<String>,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            xml: Reader::from_reader(reader),
            buf: Vec::new(),
            pending_close: None,
        }
    }

    /// Byte offset of the next token
    pub fn position(&self) -> u64 {
        self.xml.buffer_position() as u64
    }

    pub fn next_token(&mut self) -> ParseResult<Token> {
        if let Some(name) = self.pending_close.take() {
            return Ok(Token::Close { name });
        }

        loop {
            self.buf.clear();
            let event = match self.xml.read_event_into(&mut self.buf) {
                Ok(v) => v,
                Err(source) => {
                    return Err(ParseError::Xml {
                        position: self.xml.error_position() as u64,
                        source,
                    })
                }
            };

            let token = match event {
                Event::Start(bs) => Token::Open {
                    name: tag_name(&bs),
                    array_name: get_attribute_value(&bs, "name"),
                },
                Event::Empty(bs) => {
                    let name = tag_name(&bs);
                    self.pending_close = Some(name.clone());
                    Token::Open {
                        name,
                        array_name: get_attribute_value(&bs, "name"),
                    }
                }
                Event::End(be) => Token::Close {
                    name: String::from_utf8_lossy(be.local_name().as_ref()).into_owned(),
                },
                Event::Text(bt) => match bt.unescape() {
                    Ok(txt) => Token::Text(txt.into_owned()),
                    Err(e) => {
                        return Err(ParseError::Xml {
                            position: self.xml.buffer_position() as u64,
                            source: e.into(),
                        })
                    }
                },
                Event::CData(cd) => {
                    Token::Text(String::from_utf8_lossy(&cd.into_inner()).into_owned())
                }
                Event::Eof => Token::Eof,
                _ => continue,
            };

            return Ok(token);
        }
    }
}

#[derive(Debug)]
enum State {
    /// Not inside any string-array
    Outside,
    /// Inside some unrelated resource, `depth` counts the open elements
    Ignoring { depth: usize },
    /// Inside a string-array, `matched` is set if it is the one we want
    InContainer { matched: bool },
    InItem { matched: bool, text: String },
}

/// State machine collecting the items of a single named string-array
struct Harvester<'c> {
    container: &'c str,
    state: State,
    /// Open elements enclosing the current position while [State::Outside]
    depth: usize,
    seen_container: bool,
    items: Vec<String>,
}

impl<'c> Harvester<'c> {
    fn new(container: &'c str) -> Self {
        Self {
            container,
            state: State::Outside,
            depth: 0,
            seen_container: false,
            items: Vec::new(),
        }
    }

    fn feed(&mut self, token: Token, position: u64) -> ParseResult<()> {
        match token {
            Token::Open { name, array_name } => self.on_open(name, array_name, position),
            Token::Close { .. } => {
                self.on_close();
                Ok(())
            }
            Token::Text(txt) => {
                if let State::InItem { text, .. } = &mut self.state {
                    text.push_str(&txt);
                }
                Ok(())
            }
            Token::Eof => Ok(()),
        }
    }

    fn on_open(
        &mut self,
        name: String,
        array_name: Option<String>,
        position: u64,
    ) -> ParseResult<()> {
        let next = match mem::replace(&mut self.state, State::Outside) {
            State::Outside if name == STRING_ARRAY_TAG => {
                self.seen_container = true;
                let matched = array_name.as_deref() == Some(self.container);
                if !matched {
                    log::debug!(
                        "skipping string-array {:?}, looking for {}",
                        array_name,
                        self.container
                    );
                }
                State::InContainer { matched }
            }
            State::Outside if name == ITEM_TAG => {
                return Err(ParseError::ItemOutsideContainer(position));
            }
            State::Outside if self.depth == 0 => {
                self.depth += 1;
                State::Outside
            }
            State::Outside => State::Ignoring { depth: 1 },
            State::Ignoring { depth } => State::Ignoring { depth: depth + 1 },
            State::InContainer { matched } if name == ITEM_TAG => State::InItem {
                matched,
                text: String::new(),
            },
            State::InContainer { .. } => {
                return Err(ParseError::UnexpectedTag {
                    tag: name,
                    parent: STRING_ARRAY_TAG,
                    position,
                });
            }
            State::InItem { .. } if name == ITEM_TAG => {
                return Err(ParseError::NestedItem(position));
            }
            State::InItem { .. } => {
                return Err(ParseError::UnexpectedTag {
                    tag: name,
                    parent: ITEM_TAG,
                    position,
                });
            }
        };
        self.state = next;
        Ok(())
    }

    fn on_close(&mut self) {
        self.state = match mem::replace(&mut self.state, State::Outside) {
            State::Outside => {
                self.depth = self.depth.saturating_sub(1);
                State::Outside
            }
            State::Ignoring { depth } if depth <= 1 => State::Outside,
            State::Ignoring { depth } => State::Ignoring { depth: depth - 1 },
            State::InContainer { .. } => State::Outside,
            State::InItem { matched, text } => {
                if matched {
                    self.items.push(String::from(text.trim()));
                }
                State::InContainer { matched }
            }
        };
    }

    fn finish(self) -> ParseResult<Vec<String>> {
        let open = match &self.state {
            State::Outside if self.depth == 0 => None,
            State::Outside | State::Ignoring { .. } => Some("resources"),
            State::InContainer { .. } => Some(STRING_ARRAY_TAG),
            State::InItem { .. } => Some(ITEM_TAG),
        };

        if let Some(tag) = open {
            return Err(ParseError::UnexpectedEof(tag.into()));
        }

        if !self.seen_container {
            return Err(ParseError::MissingContainer);
        }

        Ok(self.items)
    }
}

/// Parser for repo lists stored in a named string-array
pub struct RepoListParser<'c> {
    container: &'c str,
}

impl RepoListParser<'static> {
    /// Parser for the repo list shipped with the application
    pub fn bundled() -> Self {
        Self::new(BUNDLED_CONTAINER)
    }

    /// Parser for vendor provided repo lists
    pub fn oem() -> Self {
        Self::new(OEM_CONTAINER)
    }
}

impl<'c> RepoListParser<'c> {
    pub fn new(container: &'c str) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &str {
        self.container
    }

    /// Collect the text of every `<item>` in the container, in document order
    ///
    /// No validation of the items is done here, see [Self::parse_records].
    pub fn harvest<R: BufRead>(&self, reader: R) -> ParseResult<Vec<String>> {
        let mut scanner = Scanner::new(reader);
        let mut harvester = Harvester::new(self.container);

        loop {
            let position = scanner.position();
            match scanner.next_token()? {
                Token::Eof => return harvester.finish(),
                token => harvester.feed(token, position)?,
            }
        }
    }

    /// Parse the repo list into validated records with a priority of 0
    ///
    /// A structurally valid list with the wrong number of items or an invalid
    /// repository yields no records at all.
    pub fn parse_records<R: BufRead>(&self, reader: R) -> ParseResult<Vec<RepoRecord>> {
        let items = self.harvest(reader)?;
        match records_from_items(items) {
            Ok(v) => Ok(v),
            Err(e) => {
                log::warn!("ignoring {} repo list: {}", self.container, e);
                Ok(Vec::new())
            }
        }
    }

    /// Same as [Self::parse_records] but flattened, the result length is always a
    /// multiple of [crate::FIELDS_PER_RECORD]
    pub fn parse_fields<R: BufRead>(&self, reader: R) -> ParseResult<Vec<String>> {
        Ok(flatten(&self.parse_records(reader)?))
    }

    pub fn parse_str(&self, s: &str) -> ParseResult<Vec<RepoRecord>> {
        self.parse_records(s.as_bytes())
    }

    pub fn parse_file(&self, path: &Path) -> crate::Result<Vec<RepoRecord>> {
        let file = open_file(path)?;
        self.parse_records(BufReader::new(file))
            .map_err(|e| crate::Error::new_parse(&path_lossy(path), e))
    }
}
