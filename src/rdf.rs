//! Minimal RDF graph for RELS-EXT and Resource Index results.
//!
//! Only the RDF/XML shapes Fedora writes are understood: `rdf:Description`
//! (or typed) nodes whose properties are either `rdf:resource` references or
//! plain text literals.

use crate::utils::error::{FedoraError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const FEDORA_MODEL_NS: &str = "info:fedora/fedora-system:def/model#";
pub const FEDORA_RELS_NS: &str = "info:fedora/fedora-system:def/relations-external#";

pub const HAS_MODEL: &str = "info:fedora/fedora-system:def/model#hasModel";
pub const IS_MEMBER_OF: &str = "info:fedora/fedora-system:def/relations-external#isMemberOf";
pub const IS_MEMBER_OF_COLLECTION: &str =
    "info:fedora/fedora-system:def/relations-external#isMemberOfCollection";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

const FEDORA_URI_PREFIX: &str = "info:fedora/";

/// `demo:1` -> `info:fedora/demo:1`
pub fn pid_to_uri(pid: &str) -> String {
    if pid.starts_with(FEDORA_URI_PREFIX) {
        pid.to_string()
    } else {
        format!("{}{}", FEDORA_URI_PREFIX, pid)
    }
}

pub fn uri_to_pid(uri: &str) -> &str {
    uri.strip_prefix(FEDORA_URI_PREFIX).unwrap_or(uri)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Uri(String),
    Literal(String),
    Blank(String),
}

impl Term {
    pub fn as_str(&self) -> &str {
        match self {
            Term::Uri(v) | Term::Literal(v) | Term::Blank(v) => v,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri(v) => write!(f, "<{}>", v),
            Term::Literal(v) => write!(f, "{:?}", v),
            Term::Blank(v) => write!(f, "_:{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    triples: Vec<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn add(&mut self, subject: Term, predicate: &str, object: Term) {
        let triple = Triple {
            subject,
            predicate: predicate.to_string(),
            object,
        };
        if !self.triples.contains(&triple) {
            self.triples.push(triple);
        }
    }

    pub fn remove(&mut self, subject: &Term, predicate: &str, object: &Term) -> bool {
        let before = self.triples.len();
        self.triples
            .retain(|t| !(&t.subject == subject && t.predicate == predicate && &t.object == object));
        before != self.triples.len()
    }

    pub fn objects<'a>(&'a self, subject: &'a Term, predicate: &'a str) -> impl Iterator<Item = &'a Term> {
        self.triples
            .iter()
            .filter(move |t| &t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// predicate -> objects for one subject
    pub fn relations(&self, subject: &Term) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for t in self.triples.iter().filter(|t| &t.subject == subject) {
            map.entry(t.predicate.clone())
                .or_default()
                .push(t.object.as_str().to_string());
        }
        map
    }

    pub fn parse_rdf_xml(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut graph = Graph::new();
        let mut depth = 0usize;
        let mut rdf_depth: Option<usize> = None;
        let mut subject: Option<Term> = None;
        let mut property: Option<(String, String)> = None;
        let mut blank_counter = 0usize;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = qualified_name(&ns, e.local_name().as_ref());
                    depth += 1;

                    match rdf_depth {
                        None => {
                            if name == format!("{}RDF", RDF_NS) {
                                rdf_depth = Some(depth);
                            }
                        }
                        Some(root) if depth == root + 1 => {
                            // node element
                            let node = match (
                                attribute(&reader, e, "about")?,
                                attribute(&reader, e, "nodeID")?,
                            ) {
                                (Some(about), _) => Term::Uri(about),
                                (None, Some(id)) => Term::Blank(id),
                                (None, None) => {
                                    blank_counter += 1;
                                    Term::Blank(format!("genid{}", blank_counter))
                                }
                            };
                            if name != format!("{}Description", RDF_NS) {
                                graph.add(node.clone(), RDF_TYPE, Term::Uri(name.clone()));
                            }
                            subject = Some(node);
                        }
                        Some(root) if depth == root + 2 => {
                            let Some(current) = subject.clone() else {
                                return Err(FedoraError::RdfError {
                                    message: "property outside of a node".to_string(),
                                });
                            };
                            if let Some(resource) = attribute(&reader, e, "resource")? {
                                graph.add(current, &name, Term::Uri(resource));
                            } else if let Some(id) = attribute(&reader, e, "nodeID")? {
                                graph.add(current, &name, Term::Blank(id));
                            } else if is_empty {
                                graph.add(current, &name, Term::Literal(String::new()));
                            } else {
                                property = Some((name, String::new()));
                            }
                        }
                        _ => {}
                    }

                    if is_empty {
                        depth -= 1;
                        if rdf_depth.is_some_and(|root| depth == root) {
                            subject = None;
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some((_, value)) = property.as_mut() {
                        value.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some((_, value)) = property.as_mut() {
                        value.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::End(_) => {
                    if let (Some(root), Some((predicate, value))) = (rdf_depth, property.take()) {
                        if depth == root + 2 {
                            if let Some(current) = subject.clone() {
                                graph.add(current, &predicate, Term::Literal(value));
                            }
                        } else {
                            property = Some((predicate, value));
                        }
                    }
                    if rdf_depth.is_some_and(|root| depth == root + 1) {
                        subject = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if rdf_depth.is_none() {
            return Err(FedoraError::RdfError {
                message: "no rdf:RDF element found".to_string(),
            });
        }
        Ok(graph)
    }

    pub fn parse_ntriples(text: &str) -> Result<Self> {
        let mut graph = Graph::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let caps = ntriples_pattern()
                .captures(line)
                .ok_or_else(|| FedoraError::RdfError {
                    message: format!("line {}: not an N-Triples statement", index + 1),
                })?;
            let subject = parse_nt_term(&caps[1]);
            let object = parse_nt_term(&caps[3]);
            graph.add(subject, &caps[2], object);
        }
        Ok(graph)
    }

    /// 輸出 RELS-EXT 格式的 RDF/XML
    pub fn to_rdf_xml(&self) -> Result<String> {
        let mut prefixes: BTreeMap<String, String> = BTreeMap::new();
        for t in &self.triples {
            let (ns, _) = split_predicate(&t.predicate);
            if !prefixes.contains_key(ns) {
                let prefix = match ns {
                    FEDORA_MODEL_NS => "fedora-model".to_string(),
                    FEDORA_RELS_NS => "rel".to_string(),
                    RDF_NS => "rdf".to_string(),
                    _ => format!("ns{}", prefixes.len()),
                };
                prefixes.insert(ns.to_string(), prefix);
            }
        }

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        let mut root = BytesStart::new("rdf:RDF");
        root.push_attribute(("xmlns:rdf", RDF_NS));
        for (ns, prefix) in &prefixes {
            if prefix != "rdf" {
                root.push_attribute((format!("xmlns:{}", prefix).as_str(), ns.as_str()));
            }
        }
        writer.write_event(Event::Start(root))?;

        let mut subjects: Vec<&Term> = Vec::new();
        for t in &self.triples {
            if !subjects.contains(&&t.subject) {
                subjects.push(&t.subject);
            }
        }

        for subject in subjects {
            let mut node = BytesStart::new("rdf:Description");
            match subject {
                Term::Uri(uri) => node.push_attribute(("rdf:about", uri.as_str())),
                Term::Blank(id) => node.push_attribute(("rdf:nodeID", id.as_str())),
                Term::Literal(_) => {
                    return Err(FedoraError::RdfError {
                        message: "literal used as subject".to_string(),
                    })
                }
            }
            writer.write_event(Event::Start(node))?;

            for t in self.triples.iter().filter(|t| &t.subject == subject) {
                let (ns, local) = split_predicate(&t.predicate);
                let qname = format!("{}:{}", prefixes[ns], local);
                let mut prop = BytesStart::new(qname.as_str());
                match &t.object {
                    Term::Uri(uri) => {
                        prop.push_attribute(("rdf:resource", uri.as_str()));
                        writer.write_event(Event::Empty(prop))?;
                    }
                    Term::Blank(id) => {
                        prop.push_attribute(("rdf:nodeID", id.as_str()));
                        writer.write_event(Event::Empty(prop))?;
                    }
                    Term::Literal(value) => {
                        writer.write_event(Event::Start(prop))?;
                        writer.write_event(Event::Text(BytesText::new(value)))?;
                        writer.write_event(Event::End(BytesEnd::new(qname.as_str())))?;
                    }
                }
            }
            writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| FedoraError::RdfError {
            message: e.to_string(),
        })
    }
}

fn qualified_name(ns: &ResolveResult, local: &[u8]) -> String {
    let local = String::from_utf8_lossy(local);
    match ns {
        ResolveResult::Bound(namespace) => {
            format!("{}{}", String::from_utf8_lossy(namespace.as_ref()), local)
        }
        _ => local.into_owned(),
    }
}

/// Look up an `rdf:`-namespaced attribute by local name.
fn attribute(reader: &NsReader<&[u8]>, element: &BytesStart, local: &str) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let (ns, name) = reader.resolve_attribute(attr.key);
        let in_rdf = matches!(ns, ResolveResult::Bound(n) if n.as_ref() == RDF_NS.as_bytes());
        if in_rdf && name.as_ref() == local.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn split_predicate(predicate: &str) -> (&str, &str) {
    match predicate.rfind(['#', '/']) {
        Some(idx) => predicate.split_at(idx + 1),
        None => ("", predicate),
    }
}

fn ntriples_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"^(<[^>]*>|_:\S+)\s+<([^>]*)>\s+(<[^>]*>|_:\S+|"(?:[^"\\]|\\.)*"(?:@[A-Za-z0-9\-]+|\^\^<[^>]*>)?)\s*\.$"#,
        )
        .expect("N-Triples pattern is valid")
    })
}

fn parse_nt_term(raw: &str) -> Term {
    if let Some(uri) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        return Term::Uri(uri.to_string());
    }
    if let Some(id) = raw.strip_prefix("_:") {
        return Term::Blank(id.to_string());
    }
    // 去掉語言標籤或資料型別，只保留字面值
    let end = raw.rfind('"').unwrap_or(raw.len());
    let body = raw.get(1..end).unwrap_or_default();
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(other) => value.push(other),
                None => {}
            }
        } else {
            value.push(c);
        }
    }
    Term::Literal(value)
}
