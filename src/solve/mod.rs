pub(crate) mod composite;
pub(crate) mod flood;
pub(crate) mod generate;
pub(crate) mod resample;
