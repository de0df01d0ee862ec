/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// Air kerma and absorbed dose are in mGy, tube voltage in kV.

pub type Dosef32  = f32; // TODO uom AbsorbedDose (mGy)
pub type Kermaf32 = f32; // TODO uom AbsorbedDose (mGy)
pub type Kvpf32   = f32; // TODO uom ElectricPotential (kV)
pub type Ratiof32 = f32;
