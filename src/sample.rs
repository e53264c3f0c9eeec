//! Pick the numbers out of a captured `sar` row

use std::fmt;

use crate::collector::Collected;
use crate::error::PlatformError;
use crate::layout::Columns;

/// One value from the row
///
/// `sar` prints things like `84.10`; we compare on the integer part but show
/// exactly what `sar` printed.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    raw: String,
    value: f64,
}

impl Reading {
    pub fn parse(field: &'static str, raw: &str, row: &str) -> Result<Reading, PlatformError> {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(Reading {
                raw: raw.to_owned(),
                value,
            }),
            _ => Err(PlatformError::InvalidField {
                field,
                value: raw.to_owned(),
                row: row.to_owned(),
            }),
        }
    }

    /// A reading we computed ourselves, shown with two decimals
    pub fn derived(value: f64) -> Reading {
        Reading {
            raw: format!("{:.2}", value),
            value,
        }
    }

    /// The text as it should be displayed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The integer part, truncated toward zero: `84.99` is `84`, not `85`
    pub fn truncated(&self) -> i64 {
        self.value.trunc() as i64
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The CPU percentages from one sample
///
/// Which fields are filled in depends on the platform. `idle` is always
/// there: on AIX LPARs it is computed from `physc`.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRow {
    pub user: Option<Reading>,
    pub nice: Option<Reading>,
    pub system: Option<Reading>,
    pub iowait: Option<Reading>,
    pub steal: Option<Reading>,
    /// BSD only: time spent servicing interrupts
    pub intrpt: Option<Reading>,
    pub idle: Reading,
    /// AIX only: physical processors consumed
    pub physc: Option<Reading>,
    /// AIX only: percentage of the entitled capacity consumed
    pub entc: Option<Reading>,
    /// AIX only: the LPAR's maximum capacity, in processors
    pub lpar_max_capacity: Option<Reading>,
}

struct Fields<'a> {
    row: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn get(&self, field: &'static str, position: usize) -> Result<Reading, PlatformError> {
        match self.fields.get(position) {
            Some(raw) => Reading::parse(field, raw, self.row),
            None => Err(PlatformError::MissingField {
                field,
                position,
                row: self.row.to_owned(),
            }),
        }
    }

    fn maybe(&self, field: &'static str, position: Option<usize>) -> Result<Option<Reading>, PlatformError> {
        match position {
            Some(position) => self.get(field, position).map(Some),
            None => Ok(None),
        }
    }
}

impl SampleRow {
    /// Read `row` with the positions in `columns`
    ///
    /// If the columns include `physc` then `lpar_max_capacity` must be
    /// given, and idle becomes `100 - physc / lpar_max_capacity * 100`,
    /// kept within `0..=100`.
    pub fn parse(
        columns: &Columns,
        row: &str,
        lpar_max_capacity: Option<&str>,
    ) -> Result<SampleRow, PlatformError> {
        let fields = Fields {
            row,
            fields: row.split_whitespace().collect(),
        };

        let physc = fields.maybe("physc", columns.physc)?;
        let mut idle = fields.get("idle", columns.idle)?;
        let mut max_capacity = None;
        if let Some(ref physc) = physc {
            let raw = lpar_max_capacity.unwrap_or("");
            let max = match Reading::parse("lpar_max_capacity", raw, raw) {
                Ok(ref max) if max.value() > 0.0 => max.clone(),
                _ => return Err(PlatformError::InvalidCapacity(raw.to_owned())),
            };
            // physc can round a hair past the maximum
            let derived = 100.0 - (physc.value() / max.value() * 100.0);
            idle = Reading::derived(derived.max(0.0).min(100.0));
            max_capacity = Some(max);
        }

        Ok(SampleRow {
            user: fields.maybe("user", columns.user)?,
            nice: fields.maybe("nice", columns.nice)?,
            system: fields.maybe("system", columns.system)?,
            iowait: fields.maybe("iowait", columns.iowait)?,
            steal: fields.maybe("steal", columns.steal)?,
            intrpt: fields.maybe("intrpt", columns.intrpt)?,
            idle,
            physc,
            entc: fields.maybe("entc", columns.entc)?,
            lpar_max_capacity: max_capacity,
        })
    }

    /// Parse the row that the collector captured
    pub fn from_collected(collected: &Collected) -> Result<SampleRow, PlatformError> {
        SampleRow::parse(
            &collected.layout.columns,
            &collected.row,
            collected.lpar_max_capacity.as_ref().map(|s| s.as_str()),
        )
    }
}
