//! The release plan: which fragments merge into which output units, and the
//! per-variant substitution rules.
//!
//! All variant-specific behavior lives here as explicit configuration data;
//! `release_variant` just walks the plan. The shipped plan mirrors the layout
//! of the generic SHT driver source tree.

use anyhow::bail;
use camino::{Utf8Path, Utf8PathBuf};
use relgen_squash::Substitution;
use std::fmt;
use std::str::FromStr;

/// Sensor models a release can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sensor {
    Shtc1,
    Shtw2,
    Sht3x,
}

impl Sensor {
    pub const ALL: [Sensor; 3] = [Sensor::Shtc1, Sensor::Shtw2, Sensor::Sht3x];

    /// Lowercase identifier used for file and directory names.
    pub fn id(self) -> &'static str {
        match self {
            Sensor::Shtc1 => "shtc1",
            Sensor::Shtw2 => "shtw2",
            Sensor::Sht3x => "sht3x",
        }
    }

    /// Marketing spelling substituted for the `[###SENSOR###]` token.
    pub fn display_name(self) -> &'static str {
        match self {
            Sensor::Shtc1 => "SHTC1",
            Sensor::Shtw2 => "SHTW2",
            Sensor::Sht3x => "SHT3x",
        }
    }

    /// Header-guard token, e.g. `SHT3X_H`.
    fn include_guard(self) -> &'static str {
        match self {
            Sensor::Shtc1 => "SHTC1_H",
            Sensor::Shtw2 => "SHTW2_H",
            Sensor::Sht3x => "SHT3X_H",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Sensor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shtc1" => Ok(Sensor::Shtc1),
            "shtw2" => Ok(Sensor::Shtw2),
            "sht3x" => Ok(Sensor::Sht3x),
            other => bail!("unknown sensor {other:?} (expected shtc1, shtw2 or sht3x)"),
        }
    }
}

/// Bus-transport flavors of the bundled I2C layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Transport {
    HwI2c,
    SwI2c,
}

impl Transport {
    pub const ALL: [Transport; 2] = [Transport::HwI2c, Transport::SwI2c];

    pub fn id(self) -> &'static str {
        match self {
            Transport::HwI2c => "hw_i2c",
            Transport::SwI2c => "sw_i2c",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hw_i2c" => Ok(Transport::HwI2c),
            "sw_i2c" => Ok(Transport::SwI2c),
            other => bail!("unknown transport {other:?} (expected hw_i2c or sw_i2c)"),
        }
    }
}

/// Fragment set contributed by one transport flavor.
#[derive(Debug, Clone)]
pub struct TransportFiles {
    /// Merged before the driver's own source files.
    pub source_merge: Vec<Utf8PathBuf>,
    /// Merged into the configuration header.
    pub configuration_header_merge: Vec<Utf8PathBuf>,
    /// The transport implementation, released as its own unit.
    pub configuration_source: Utf8PathBuf,
}

/// Everything a release run needs to know about the source tree, as one
/// explicit configuration value. Paths are relative to the source root.
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    /// Files copied into every bundle as their own units.
    pub copy_files: Vec<Utf8PathBuf>,
    /// Example programs, each released as its own unit.
    pub example_source_files: Vec<Utf8PathBuf>,
    /// The generic driver interface header.
    pub driver_header: Utf8PathBuf,
    /// The architecture-configuration header in the source tree.
    pub arch_config_header: Utf8PathBuf,
    /// Output name of the configuration header, also what sibling units
    /// quote-include.
    pub arch_config_header_name: String,
    /// Shared driver internals, merged (with `static` rewriting) ahead of the
    /// per-sensor source.
    pub source_merge_files: Vec<Utf8PathBuf>,
    /// Closed-source additions to the driver source unit. Non-empty lists
    /// switch every unit to the SLA license header.
    pub proprietary_source_merge_files: Vec<Utf8PathBuf>,
    /// Closed-source additions to the driver header unit.
    pub proprietary_header_merge_files: Vec<Utf8PathBuf>,
    /// Use the SLA header even without proprietary merge files.
    pub force_proprietary_license: bool,
    /// Location of the SLA copyright header in the source tree.
    pub sla_header: Utf8PathBuf,
}

impl ReleasePlan {
    /// The plan for the stock SHT driver tree.
    pub fn standard() -> Self {
        Self {
            copy_files: Vec::new(),
            example_source_files: vec!["example_usage.c".into()],
            driver_header: "sht.h".into(),
            arch_config_header: "embedded-common/sensirion_arch_config.h".into(),
            arch_config_header_name: "sensirion_arch_config.h".to_string(),
            source_merge_files: vec!["sht_common.c".into()],
            proprietary_source_merge_files: Vec::new(),
            proprietary_header_merge_files: Vec::new(),
            force_proprietary_license: false,
            sla_header: "licences/sla_copyright.txt".into(),
        }
    }

    /// The per-sensor driver body merged into `<sensor>.c`. The SHTW2 shares
    /// its die with the SHTC1 and reuses that driver source wholesale.
    pub fn sensor_merge_file(&self, sensor: Sensor) -> &Utf8Path {
        match sensor {
            Sensor::Shtc1 | Sensor::Shtw2 => Utf8Path::new("shtc1.c"),
            Sensor::Sht3x => Utf8Path::new("sht3x.c"),
        }
    }

    pub fn transport_files(&self, transport: Transport) -> TransportFiles {
        match transport {
            Transport::HwI2c => TransportFiles {
                source_merge: Vec::new(),
                configuration_header_merge: vec!["embedded-common/sensirion_i2c.h".into()],
                configuration_source: "embedded-common/hw_i2c/sensirion_hw_i2c_implementation.c"
                    .into(),
            },
            Transport::SwI2c => TransportFiles {
                source_merge: vec!["embedded-common/sw_i2c/sensirion_sw_i2c.c".into()],
                configuration_header_merge: vec![
                    "embedded-common/sw_i2c/sensirion_sw_i2c_gpio.h".into(),
                ],
                configuration_source: "embedded-common/sw_i2c/sensirion_sw_i2c_implementation.c"
                    .into(),
            },
        }
    }

    /// Substitutions for the driver header unit: retarget the include guard
    /// and spell out the sensor name.
    pub fn header_substitutions(&self, sensor: Sensor) -> Vec<Substitution> {
        vec![
            sub("SHT_H", sensor.include_guard()),
            sensor_token(sensor),
        ]
    }

    /// Substitutions for the driver source unit.
    pub fn source_substitutions(&self, sensor: Sensor) -> Vec<Substitution> {
        let mut subs = Vec::new();
        if sensor == Sensor::Shtw2 {
            // The merged body is the SHTC1 driver; rebrand its identifiers.
            subs.push(sub("SHTC1", "SHTW2"));
        }
        subs.push(sensor_token(sensor));
        subs
    }

    /// Substitutions for configuration, example and copied units.
    pub fn other_substitutions(&self, sensor: Sensor) -> Vec<Substitution> {
        vec![sensor_token(sensor)]
    }

    pub fn requires_proprietary_license(&self) -> bool {
        self.force_proprietary_license
            || !self.proprietary_source_merge_files.is_empty()
            || !self.proprietary_header_merge_files.is_empty()
    }
}

impl Default for ReleasePlan {
    fn default() -> Self {
        Self::standard()
    }
}

fn sensor_token(sensor: Sensor) -> Substitution {
    sub(r"\[###SENSOR###\]", sensor.display_name())
}

fn sub(pattern: &str, replacement: &str) -> Substitution {
    Substitution::new(pattern, replacement).expect("valid substitution pattern")
}
