use crate::core::types::AuthCode;

pub trait FromRandom {
    fn from_random() -> Self;
}

impl FromRandom for AuthCode {
    fn from_random() -> Self {
        AuthCode(random_string(48))
    }
}

fn random_string(size: usize) -> String {
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}
