//! Settings file parser

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use units::{cm, Length};

use crate::error::ConfigurationError;
use crate::phantom::{PhantomDimensions, PhantomModel};

pub(crate) fn deserialize_uom_opt<'d, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<&str>::deserialize(deserializer)?
        .map(str::parse::<T>)
        .transpose()
        .map_err(de::Error::custom)
}

fn deserialize_uom_3d<'d, D, T>(deserializer: D) -> Result<[T; 3], D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let [x, y, z] = <[&str; 3]>::deserialize(deserializer)?;
    tr_arr_res([x.parse(), y.parse(), z.parse()])
        .map_err(de::Error::custom)
}

/// Transpose 3-array of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
fn tr_arr_res<O, E>([x, y, z]: [Result<O, E>; 3]) -> Result<[O; 3], E> {
    Ok([x?, y?, z?])
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub phantom: PhantomSettings,

    #[serde(default)]
    pub corrections: CorrectionSettings,

    #[serde(default)]
    pub normalization: Normalization,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PhantomSettings {
    pub model: PhantomModel,

    /// Identifier of the human mesh, looked up in `mesh_directory`
    #[serde(default)]
    pub human_mesh: Option<String>,

    #[serde(default = "default_mesh_directory")]
    pub mesh_directory: PathBuf,

    #[serde(default)]
    pub patient_orientation: PatientOrientation,

    /// Patient offset (x, y, z) from the centre of the head end of the table
    #[serde(default = "default_patient_offset")]
    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub patient_offset: [Length; 3],

    #[serde(default = "PhantomDimensions::standard")]
    pub dimension: PhantomDimensions,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientOrientation {
    #[default]
    HeadFirstSupine,
    FeetFirstSupine,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorrectionSettings {
    /// Use `k_tab` for every event rather than looking up measured values
    #[serde(default)]
    pub estimate_k_tab: bool,

    #[serde(default = "default_k_tab")]
    pub k_tab: f32,

    /// TOML file holding the lookup tables
    #[serde(default)]
    pub lookup: Option<PathBuf>,
}

impl Default for CorrectionSettings {
    fn default() -> Self { Self { estimate_k_tab: false, k_tab: default_k_tab(), lookup: None } }
}

/// How table/pad transmission is obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableCorrection {
    /// The same user-supplied factor for every event
    Estimate(f32),
    /// Exact-match lookup in the store
    Measured,
}

impl CorrectionSettings {
    pub fn table_correction(&self) -> TableCorrection {
        if self.estimate_k_tab { TableCorrection::Estimate(self.k_tab) }
        else                   { TableCorrection::Measured }
    }
}

/// Conversion of device coordinates into the patient frame, applied as the
/// event table is read: `T = offset + direction * T_device` for the table
/// displacement, and a sign per angle.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Normalization {
    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub translation_offset: [Length; 3],
    pub translation_direction: [f32; 3],
    pub rotation_direction: RotationDirection,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            translation_offset: [cm(0.0); 3],
            translation_direction: [1.0; 3],
            rotation_direction: RotationDirection::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RotationDirection {
    pub ap1: f32, pub ap2: f32, pub ap3: f32,
    pub at1: f32, pub at2: f32, pub at3: f32,
}

impl Default for RotationDirection {
    fn default() -> Self { Self { ap1: 1.0, ap2: 1.0, ap3: 1.0, at1: 1.0, at2: 1.0, at3: 1.0 } }
}

fn default_k_tab() -> f32 { 0.8 }
fn default_mesh_directory() -> PathBuf { "phantom_data".into() }
fn default_patient_offset() -> [Length; 3] { [cm(0.0), cm(0.0), cm(-35.0)] }

impl Settings {
    pub fn read(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigurationError::Io { path: path.into(), source })?;
        toml::from_str(&text)
            .map_err(|source| ConfigurationError::Toml { path: path.into(), source })
    }
}
