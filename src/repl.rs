//! REPL (Read-Eval-Print Loop) for anoi
//!
//! Provides an interactive environment for allocating UIDs, interning names,
//! and reading or editing contents and edges of a live space.
//!
//! Arguments that denote UIDs accept `0x..` (hex), `#..` (decimal), the name of
//! a reserved UID (`ROOT`, `NAME`, `TYPE`, ...), or a name in the default
//! namespace. Quote names that contain spaces.

use std::sync::Arc;

use tracing::debug;

use crate::atom::{Atom, Term};
use crate::codec::uid_vector_to_string;
use crate::error::{Result, SpaceError};
use crate::id::{Reserved, Uid, NIL};
use crate::namespace::{label, Namespace, DEFAULT_NAMESPACE};
use crate::space::Space;
use crate::types::TypeRegistry;

/// REPL state: a handle on the space being explored.
pub struct ReplState {
    pub space: Arc<dyn Space>,
}

/// Result of reading one line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    MetaCommand(MetaCommand),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Quit,
    /// Allocate a fresh UID
    Alloc,
    /// Intern a name: `:name <namespace> <text>`
    Name { namespace: String, text: String },
    /// Look a name up without interning: `:lookup <namespace> <text>`
    Lookup { namespace: String, text: String },
    /// List a namespace: `:names <namespace>`
    Names(String),
    Content(String),
    /// Replace contents: `:set <uid> <terms...>`
    Set { uid: String, terms: Vec<String> },
    /// Read or write an edge: `:cross <uid> <key> [value]`
    Cross { uid: String, key: String, value: Option<String> },
    Keys(String),
    /// Read or assign a type: `:type <uid> [type]`
    Type { uid: String, ty: Option<String> },
    Show(String),
    Save,
    Unknown(String),
}

impl MetaCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim_start_matches(':').trim();
        let mut args = tokenize(input);
        if args.is_empty() {
            return MetaCommand::Unknown("Type :help for commands".to_string());
        }
        let cmd = args.remove(0);

        match (cmd.as_str(), args.len()) {
            ("help" | "h" | "?", _) => MetaCommand::Help,
            ("quit" | "q" | "exit", _) => MetaCommand::Quit,
            ("alloc" | "new", _) => MetaCommand::Alloc,
            ("name", n) if n >= 2 => MetaCommand::Name {
                namespace: unquote(&args[0]),
                text: join_rest(&args[1..]),
            },
            ("name", _) => MetaCommand::Unknown(":name requires <namespace> <text>".to_string()),
            ("lookup", n) if n >= 2 => MetaCommand::Lookup {
                namespace: unquote(&args[0]),
                text: join_rest(&args[1..]),
            },
            ("lookup", _) => {
                MetaCommand::Unknown(":lookup requires <namespace> <text>".to_string())
            }
            ("names" | "ls", 0) => MetaCommand::Names(DEFAULT_NAMESPACE.to_string()),
            ("names" | "ls", _) => MetaCommand::Names(unquote(&args[0])),
            ("content" | "c", 1) => MetaCommand::Content(args.remove(0)),
            ("content" | "c", _) => MetaCommand::Unknown(":content requires <uid>".to_string()),
            ("set", n) if n >= 1 => {
                let uid = args.remove(0);
                MetaCommand::Set { uid, terms: args }
            }
            ("set", _) => MetaCommand::Unknown(":set requires <uid> [terms...]".to_string()),
            ("cross" | "x", 2 | 3) => {
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(uid), Some(key)) => MetaCommand::Cross {
                        uid,
                        key,
                        value: args.next(),
                    },
                    _ => MetaCommand::Unknown(":cross requires <uid> <key> [value]".to_string()),
                }
            }
            ("cross" | "x", _) => {
                MetaCommand::Unknown(":cross requires <uid> <key> [value]".to_string())
            }
            ("keys" | "k", 1) => MetaCommand::Keys(args.remove(0)),
            ("keys" | "k", _) => MetaCommand::Unknown(":keys requires <uid>".to_string()),
            ("type" | "t", 1 | 2) => {
                let uid = args.remove(0);
                MetaCommand::Type {
                    uid,
                    ty: args.pop(),
                }
            }
            ("type" | "t", _) => MetaCommand::Unknown(":type requires <uid> [type]".to_string()),
            ("show" | "inspect" | "i", 1) => MetaCommand::Show(args.remove(0)),
            ("show" | "inspect" | "i", _) => {
                MetaCommand::Unknown(":show requires <uid>".to_string())
            }
            ("save" | "flush" | "w", _) => MetaCommand::Save,
            (other, _) => MetaCommand::Unknown(format!("Unknown command: :{}", other)),
        }
    }
}

/// Split on whitespace, keeping double-quoted runs (quotes included) together.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in input.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn unquote(token: &str) -> String {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
        .to_string()
}

fn join_rest(tokens: &[String]) -> String {
    tokens.iter().map(|t| unquote(t)).collect::<Vec<_>>().join(" ")
}

/// Parse a UID argument. Bare reserved names win over namespace names.
fn parse_term(token: &str) -> Result<Term> {
    if let Some(reserved) = Reserved::ALL.into_iter().find(|r| r.name() == token) {
        return Ok(Term::Uid(reserved.uid()));
    }
    Term::parse(token)
}

impl ReplState {
    pub fn new(space: Arc<dyn Space>) -> Self {
        Self { space }
    }

    /// Classify one line of input
    pub fn process_line(&self, line: &str) -> InputResult {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return InputResult::Empty;
        }
        // Bare words are shorthand for `:show`
        if trimmed.starts_with(':') {
            InputResult::MetaCommand(MetaCommand::parse(trimmed))
        } else {
            InputResult::MetaCommand(MetaCommand::parse(&format!(":show {}", trimmed)))
        }
    }

    fn namespace(&self, name: &str) -> Result<Namespace<'_, dyn Space>> {
        Namespace::open(self.space.as_ref(), name)
    }

    /// Like `namespace`, but never creates it.
    fn find_namespace(&self, name: &str) -> Result<Option<Namespace<'_, dyn Space>>> {
        Namespace::find(self.space.as_ref(), name)
    }

    /// Resolve an argument, interning names.
    fn intern(&self, token: &str) -> Result<Uid> {
        parse_term(token)?.resolve(&self.namespace(DEFAULT_NAMESPACE)?)
    }

    /// Resolve an argument without writing: `None` for an unbound name.
    fn resolve_bound(&self, token: &str) -> Result<Option<Uid>> {
        match parse_term(token)? {
            Term::Uid(uid) => {
                self.space.check(uid)?;
                Ok(Some(uid))
            }
            Term::Name(name) => match self.find_namespace(DEFAULT_NAMESPACE)? {
                Some(ns) => ns.lookup(&name),
                None => Ok(None),
            },
        }
    }

    /// Resolve an argument that must already exist.
    fn existing(&self, token: &str) -> Result<Uid> {
        self.resolve_bound(token)?.ok_or_else(|| {
            SpaceError::unsupported(format!("unknown name '{}'", unquote(token)))
        })
    }

    fn label(&self, uid: Uid) -> Result<String> {
        label(self.space.as_ref(), uid)
    }

    fn format_content(&self, content: &[Uid]) -> Result<String> {
        if content.is_empty() {
            return Ok("[]".to_string());
        }
        if content.iter().all(|u| u.as_char().is_some()) {
            return Ok(format!("{:?}", uid_vector_to_string(content)?));
        }
        let labels = content
            .iter()
            .map(|&u| self.label(u))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("[{}]", labels.join(" ")))
    }

    /// Execute a command, returning the text to print.
    pub fn execute(&self, cmd: &MetaCommand) -> Result<String> {
        debug!(?cmd, "executing");
        match cmd {
            MetaCommand::Help => Ok(HELP.to_string()),
            MetaCommand::Quit => Ok(String::new()),
            MetaCommand::Alloc => Ok(self.space.allocate()?.to_string()),
            MetaCommand::Name { namespace, text } => {
                Ok(self.namespace(namespace)?.get_name(text)?.to_string())
            }
            MetaCommand::Lookup { namespace, text } => {
                let found = match self.find_namespace(namespace)? {
                    Some(ns) => ns.lookup(text)?,
                    None => None,
                };
                match found {
                    Some(uid) => Ok(uid.to_string()),
                    None => Ok(format!("'{}' is not bound in {}", text, namespace)),
                }
            }
            MetaCommand::Names(namespace) => {
                let names = match self.find_namespace(namespace)? {
                    Some(ns) => ns.names()?,
                    None => Vec::new(),
                };
                if names.is_empty() {
                    return Ok(format!("{} is empty", namespace));
                }
                Ok(names
                    .iter()
                    .map(|(name, uid)| format!("  {:?} = {}", name, uid))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            MetaCommand::Content(uid) => {
                let uid = self.existing(uid)?;
                self.format_content(&self.space.get_content(uid)?)
            }
            MetaCommand::Set { uid, terms } => {
                let uid = self.existing(uid)?;
                let terms = terms
                    .iter()
                    .map(|t| parse_term(t))
                    .collect::<Result<Vec<_>>>()?;
                let mut atom = Atom::open(uid, self.namespace(DEFAULT_NAMESPACE)?)?;
                atom.build(terms, Vec::new())?;
                atom.store()?;
                self.format_content(atom.contents().unwrap_or_default())
            }
            MetaCommand::Cross { uid, key, value } => {
                let uid = self.existing(uid)?;
                let result = match value {
                    Some(value) => {
                        let key = self.intern(key)?;
                        let value = self.intern(value)?;
                        self.space.cross_equals(uid, key, Some(value))?
                    }
                    // An unbound name keys no edge
                    None => match self.resolve_bound(key)? {
                        Some(key) => self.space.cross(uid, key)?,
                        None => NIL,
                    },
                };
                self.label(result)
            }
            MetaCommand::Keys(uid) => {
                let uid = self.existing(uid)?;
                let keys = self
                    .space
                    .get_keys(uid)?
                    .into_iter()
                    .map(|k| self.label(k))
                    .collect::<Result<Vec<_>>>()?;
                Ok(keys.join(" "))
            }
            MetaCommand::Type { uid, ty } => {
                let uid = self.existing(uid)?;
                if let Some(ty) = ty {
                    let types = TypeRegistry::open(self.space.as_ref())?;
                    types.assign(uid, types.get(&unquote(ty))?)?;
                }
                match self.space.cross(uid, Reserved::Type.uid())? {
                    t if t.is_nil() => Ok("untyped".to_string()),
                    t => self.label(t),
                }
            }
            MetaCommand::Show(uid) => self.show(self.existing(uid)?),
            MetaCommand::Save => {
                self.space.flush()?;
                Ok("Saved".to_string())
            }
            MetaCommand::Unknown(msg) => Err(SpaceError::unsupported(msg.clone())),
        }
    }

    fn show(&self, uid: Uid) -> Result<String> {
        let mut out = format!("{} ({})\n", self.label(uid)?, uid);
        out.push_str(&format!(
            "  content: {}\n",
            self.format_content(&self.space.get_content(uid)?)?
        ));
        for key in self.space.get_keys(uid)? {
            let value = self.space.cross(uid, key)?;
            out.push_str(&format!("  {} -> {}\n", self.label(key)?, self.label(value)?));
        }
        Ok(out.trim_end().to_string())
    }
}

const HELP: &str = "\
Commands:
  :alloc                       allocate a fresh UID
  :name <ns> <text>            intern <text> in namespace <ns>
  :lookup <ns> <text>          look up <text> without interning
  :names [ns]                  list a namespace (default: default)
  :content <uid>               print the content of <uid>
  :set <uid> <terms...>        replace the content of <uid>
  :cross <uid> <key> [value]   read or write an edge
  :keys <uid>                  list the edge keys of <uid>
  :type <uid> [type]           read or assign the type of <uid>
  :show <uid>                  content and edges of <uid>
  :save                        flush the space to its backing store
  :help                        this message
  :quit                        exit

UIDs: 0x41 (hex), #65 (decimal), a reserved name (ROOT, NAME, TYPE, ...),
or a name in the default namespace. Quote names with spaces.";
