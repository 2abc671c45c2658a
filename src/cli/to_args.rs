use std::ffi::OsString;

/// Render parsed arguments back into the argv that would produce them.
pub trait ToArgs {
    fn to_args(&self) -> Vec<OsString>;
}
