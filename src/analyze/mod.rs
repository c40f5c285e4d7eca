pub mod baseline;
pub mod classifier;
pub mod fingerprint;

pub use baseline::{Baseline, BaselineProber};
pub use classifier::{ResponseClassifier, Verdict};
pub use fingerprint::{Fingerprint, Signature, Strategy};
