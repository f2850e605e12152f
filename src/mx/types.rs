use std::collections::HashSet;
use std::fmt;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Mail exchangers of a domain, ascending preference. Never empty.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "with-serde",
    serde(try_from = "Vec<MxRecord>", into = "Vec<MxRecord>")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecordSet {
    records: Vec<MxRecord>,
}

impl MxRecordSet {
    /// Builds a set from raw answers. Returns `None` when no usable exchange
    /// remains (empty answer or null MX).
    ///
    /// Equal preferences keep their answer order. A repeated exchange keeps
    /// only its best preference.
    pub fn from_records(mut records: Vec<MxRecord>) -> Option<Self> {
        records.retain(|record| !record.exchange.is_empty());
        records.sort_by_key(|record| record.preference);
        let mut seen = HashSet::new();
        records.retain(|record| seen.insert(record.exchange.clone()));
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    pub fn records(&self) -> &[MxRecord] {
        &self.records
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.exchange.as_str())
    }

    /// Highest priority exchange (lowest preference value).
    pub fn primary(&self) -> &MxRecord {
        &self.records[0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TryFrom<Vec<MxRecord>> for MxRecordSet {
    type Error = &'static str;

    fn try_from(records: Vec<MxRecord>) -> Result<Self, Self::Error> {
        Self::from_records(records).ok_or("MX record set needs at least one exchange")
    }
}

impl From<MxRecordSet> for Vec<MxRecord> {
    fn from(set: MxRecordSet) -> Self {
        set.records
    }
}

/// Why a domain has no usable mail routing.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    NoRecords,
    /// RFC 7505 null MX: the domain explicitly accepts no mail.
    NullMx,
    NxDomain,
    NoNameservers,
    Timeout,
    Failed(String),
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecords => f.write_str("no MX records"),
            Self::NullMx => f.write_str("null MX"),
            Self::NxDomain => f.write_str("domain does not exist"),
            Self::NoNameservers => f.write_str("no nameservers available"),
            Self::Timeout => f.write_str("DNS timeout"),
            Self::Failed(message) => write!(f, "lookup failed: {message}"),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxStatus {
    Records(MxRecordSet),
    Absent(AbsentReason),
}

impl MxStatus {
    pub fn records(&self) -> &[MxRecord] {
        match self {
            Self::Records(set) => set.records(),
            Self::Absent(_) => &[],
        }
    }

    pub fn record_set(&self) -> Option<&MxRecordSet> {
        match self {
            Self::Records(set) => Some(set),
            Self::Absent(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }
}
