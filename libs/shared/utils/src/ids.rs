use chrono::Utc;
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Public identifier of the form `<prefix><6 timestamp digits><3 base-36 chars>`,
/// e.g. `A123456XYZ`. Prefixes: `P` patient, `D` doctor, `A` appointment.
pub fn generate_public_id(prefix: char) -> String {
    let timestamp = Utc::now().timestamp_millis().rem_euclid(1_000_000);

    let mut rng = rand::thread_rng();
    let suffix: String = (0..3)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{}{:06}{}", prefix, timestamp, suffix)
}
