//! Hierarchical name → function lookup.
//!
//! Paths are split on a single delimiter (`billing:refund`) and resolved by
//! walking nested namespaces left to right. Registries are filled once while
//! the engine is built and are read-only afterwards.

use std::collections::HashMap;

use warden_core::{EntryKind, NotFoundError, RegistryError};

#[derive(Debug)]
enum Entry<T> {
    Item(T),
    Namespace(Namespace<T>),
}

#[derive(Debug)]
struct Namespace<T> {
    entries: HashMap<String, Entry<T>>,
}

impl<T> Default for Namespace<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

/// Registry of activities or assertions.
#[derive(Debug)]
pub struct Registry<T> {
    kind: EntryKind,
    delimiter: char,
    root: Namespace<T>,
}

impl<T> Registry<T> {
    pub fn new(kind: EntryKind, delimiter: char) -> Self {
        Self {
            kind,
            delimiter,
            root: Namespace::default(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Store `item` at `path`, creating intermediate namespaces.
    ///
    /// An existing item at the same path is replaced.
    pub fn insert(&mut self, path: &str, item: T) -> Result<(), RegistryError> {
        let kind = self.kind;
        if path.is_empty() {
            return Err(RegistryError::EmptyPath { kind });
        }

        let segments: Vec<&str> = path.split(self.delimiter).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RegistryError::EmptySegment {
                kind,
                path: path.to_string(),
            });
        }

        let (last, parents) = segments
            .split_last()
            .ok_or(RegistryError::EmptyPath { kind })?;

        let mut namespace = &mut self.root;
        for segment in parents {
            let entry = namespace
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Entry::Namespace(Namespace::default()));
            namespace = match entry {
                Entry::Namespace(ns) => ns,
                Entry::Item(_) => {
                    return Err(RegistryError::NotANamespace {
                        kind,
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
            };
        }

        if let Some(Entry::Namespace(_)) = namespace.entries.get(*last) {
            return Err(RegistryError::NamespaceOccupied {
                kind,
                path: path.to_string(),
            });
        }
        namespace.entries.insert(last.to_string(), Entry::Item(item));
        Ok(())
    }

    /// Resolve `path` to the function stored there.
    ///
    /// Fails when any segment is missing or when the path ends on a namespace.
    pub fn resolve(&self, path: &str) -> Result<&T, NotFoundError> {
        let not_found = || NotFoundError {
            kind: self.kind,
            path: path.to_string(),
        };

        let mut segments = path.split(self.delimiter);
        let first = segments.next().ok_or_else(not_found)?;
        let mut entry = self.root.entries.get(first).ok_or_else(not_found)?;
        for segment in segments {
            entry = match entry {
                Entry::Namespace(ns) => ns.entries.get(segment).ok_or_else(not_found)?,
                Entry::Item(_) => return Err(not_found()),
            };
        }

        match entry {
            Entry::Item(item) => Ok(item),
            Entry::Namespace(_) => Err(not_found()),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    /// Number of stored functions (namespaces are not counted).
    pub fn len(&self) -> usize {
        fn count<T>(ns: &Namespace<T>) -> usize {
            ns.entries
                .values()
                .map(|e| match e {
                    Entry::Item(_) => 1,
                    Entry::Namespace(inner) => count(inner),
                })
                .sum()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(&self.root, self.delimiter, &mut String::new(), &mut out);
        out.sort();
        out
    }
}

fn collect_paths<T>(ns: &Namespace<T>, delimiter: char, prefix: &mut String, out: &mut Vec<String>) {
    for (name, entry) in &ns.entries {
        let len = prefix.len();
        if !prefix.is_empty() {
            prefix.push(delimiter);
        }
        prefix.push_str(name);
        match entry {
            Entry::Item(_) => out.push(prefix.clone()),
            Entry::Namespace(inner) => collect_paths(inner, delimiter, prefix, out),
        }
        prefix.truncate(len);
    }
}
