pub mod creditfxjump;
pub mod deterministiccurves;
pub mod equitysimulator;
pub mod hullwhite;
pub(crate) mod registration;
