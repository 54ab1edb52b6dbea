//! Demo-side renderers driving an accelerator.

pub mod ao;
