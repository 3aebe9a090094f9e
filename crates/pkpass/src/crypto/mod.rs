pub mod cert;
pub mod cms;
pub mod verify;

pub use cert::{load_private_key, Certificate, SigningCredentials};
pub use cms::{sign, sign_at, SignedAttributes};
pub use verify::{parse_signature, SignatureInfo};
