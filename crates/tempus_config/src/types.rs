//! Configuration types deserialized from `tempus.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// The top-level project configuration parsed from `tempus.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// The design to analyze.
    pub design: DesignConfig,
    /// Which constraint checks run and how.
    #[serde(default)]
    pub check_timing: CheckTimingConfig,
    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Design inputs. Paths are relative to the project directory.
#[derive(Debug, Deserialize)]
pub struct DesignConfig {
    /// The design name, used in report headers.
    pub name: String,
    /// Path to the timing graph (JSON).
    pub netlist: String,
    /// SDC constraint files, read in order.
    ///
    /// Accepts a single path or a list of paths.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub sdc: Vec<String>,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `sdc = "top.sdc"` as well as `sdc = ["clocks.sdc", "io.sdc"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Settings for the `check-timing` command.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct CheckTimingConfig {
    /// Checks to run by name (e.g. `"loops"`). Empty runs every check.
    #[serde(default)]
    pub checks: Vec<String>,
    /// Checks to leave out, applied after `checks`.
    #[serde(default)]
    pub skip: Vec<String>,
    /// Whether latch data-to-output arcs break combinational loops.
    #[serde(default = "default_true")]
    pub latch_breaks_loops: bool,
    /// Upper bound on vertices visited by the loop search.
    #[serde(default)]
    pub loop_vertex_budget: Option<usize>,
}

impl Default for CheckTimingConfig {
    fn default() -> Self {
        Self {
            checks: Vec::new(),
            skip: Vec::new(),
            latch_breaks_loops: true,
            loop_vertex_budget: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Report output settings.
#[derive(Debug, Default, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,
}

/// How check results are printed.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable diagnostics (default).
    #[default]
    Text,
    /// One JSON document on stdout.
    Json,
}
