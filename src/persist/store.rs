use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::explorer::nav_graph::{NavigationEdge, ScreenNode};
use crate::explorer::session::ExplorationSummary;
use crate::persist::records::{ElementRecord, StoredRecord};

/// Persistence collaborator. Called incrementally while exploring and once
/// with the final summary.
pub trait ExplorationStore {
    fn save_screen(&mut self, screen: &ScreenNode) -> Result<(), PersistError>;

    fn save_element(&mut self, element: &ElementRecord) -> Result<(), PersistError>;

    fn save_edge(&mut self, edge: &NavigationEdge) -> Result<(), PersistError>;

    fn save_session(&mut self, summary: &ExplorationSummary) -> Result<(), PersistError>;
}

#[derive(Debug)]
pub enum PersistError {
    Io { context: String, source: std::io::Error },
    Serialize { context: String, source: serde_json::Error },
    Parse { line: usize, source: serde_json::Error },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io { context, source } => write!(f, "I/O error ({}): {}", context, source),
            PersistError::Serialize { context, source } => {
                write!(f, "JSON serialize error ({}): {}", context, source)
            }
            PersistError::Parse { line, source } => write!(f, "JSON parse error on line {}: {}", line, source),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io { source, .. } => Some(source),
            PersistError::Serialize { source, .. } => Some(source),
            PersistError::Parse { source, .. } => Some(source),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub screens: Vec<ScreenNode>,
    pub elements: Vec<ElementRecord>,
    pub edges: Vec<NavigationEdge>,
    pub sessions: Vec<ExplorationSummary>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, in the order a `JsonlStore` would write it
    /// grouped by kind.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.screens
            .iter()
            .cloned()
            .map(StoredRecord::Screen)
            .chain(self.elements.iter().cloned().map(StoredRecord::Element))
            .chain(self.edges.iter().cloned().map(StoredRecord::Edge))
            .chain(self.sessions.iter().cloned().map(StoredRecord::Session))
            .collect()
    }
}

impl ExplorationStore for MemoryStore {
    fn save_screen(&mut self, screen: &ScreenNode) -> Result<(), PersistError> {
        self.screens.push(screen.clone());
        Ok(())
    }

    fn save_element(&mut self, element: &ElementRecord) -> Result<(), PersistError> {
        self.elements.push(element.clone());
        Ok(())
    }

    fn save_edge(&mut self, edge: &NavigationEdge) -> Result<(), PersistError> {
        self.edges.push(edge.clone());
        Ok(())
    }

    fn save_session(&mut self, summary: &ExplorationSummary) -> Result<(), PersistError> {
        self.sessions.push(summary.clone());
        Ok(())
    }
}

// ============================================================================
// JSON-lines file store
// ============================================================================

/// Appends one [`StoredRecord`] per line.
pub struct JsonlStore {
    file: File,
    path: String,
}

impl JsonlStore {
    /// Create (truncate) the file at `path`.
    pub fn create(path: &Path) -> Result<Self, PersistError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| PersistError::Io {
                context: format!("open {}", path.display()),
                source,
            })?;
        Ok(Self {
            file,
            path: path.display().to_string(),
        })
    }

    fn append(&mut self, record: &StoredRecord) -> Result<(), PersistError> {
        let json = serde_json::to_string(record).map_err(|source| PersistError::Serialize {
            context: "stored record".into(),
            source,
        })?;
        writeln!(self.file, "{}", json).map_err(|source| PersistError::Io {
            context: format!("write {}", self.path),
            source,
        })
    }
}

impl ExplorationStore for JsonlStore {
    fn save_screen(&mut self, screen: &ScreenNode) -> Result<(), PersistError> {
        self.append(&StoredRecord::Screen(screen.clone()))
    }

    fn save_element(&mut self, element: &ElementRecord) -> Result<(), PersistError> {
        self.append(&StoredRecord::Element(element.clone()))
    }

    fn save_edge(&mut self, edge: &NavigationEdge) -> Result<(), PersistError> {
        self.append(&StoredRecord::Edge(edge.clone()))
    }

    fn save_session(&mut self, summary: &ExplorationSummary) -> Result<(), PersistError> {
        self.append(&StoredRecord::Session(summary.clone()))?;
        self.file.flush().map_err(|source| PersistError::Io {
            context: format!("flush {}", self.path),
            source,
        })
    }
}

/// Read back every record of a `JsonlStore` file. Blank lines are skipped.
pub fn load_records(path: &Path) -> Result<Vec<StoredRecord>, PersistError> {
    let file = File::open(path).map_err(|source| PersistError::Io {
        context: format!("open {}", path.display()),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| PersistError::Io {
            context: format!("read {}", path.display()),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| PersistError::Parse {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
