#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod digest;
mod engine;
mod sha1;
mod sha256;
mod snapshot;

pub use digest::BlockDigest;
pub use engine::{Accumulator, BLOCK_LEN, Compress, DigestError, STATE_FOOTER_LEN, WORD_LEN};
pub use sha1::{SHA1_DIGEST_LEN, Sha1};
pub use sha256::{SHA256_DIGEST_LEN, Sha256};
pub use snapshot::Snapshot;
