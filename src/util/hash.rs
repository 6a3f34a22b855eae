use crate::core::types::{AuthCode, HashedAuthCode};

pub trait HashTo: AsRef<str> {
    type HashedType: From<String>;
}

impl HashTo for AuthCode {
    type HashedType = HashedAuthCode;
}

/// Unsalted SHA-512 digest, for values that are looked up by their hash.
pub fn hash_without_salt<T: HashTo>(to_hash: &T) -> T::HashedType {
    use sha2::Digest;

    let digest = sha2::Sha512::digest(to_hash.as_ref().as_bytes());
    base64::encode_config(digest, base64::URL_SAFE).into()
}

pub fn hash_code(code: &AuthCode) -> HashedAuthCode {
    hash_without_salt(code)
}
