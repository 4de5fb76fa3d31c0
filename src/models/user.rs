use uuid::Uuid;

use crate::crypto::envelope::CipherBlob;

/// Represents a registered lamp owner.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub user_id: Uuid,
    /// The user's email address, stored case-normalized.
    pub email: String,
    /// The salted Argon2id hash of the user's password. The plaintext is
    /// never stored and cannot be recovered from this.
    pub password_hash: String,
    /// The identifiers of the lamps this user owns.
    pub lamp_ids: Vec<String>,
    /// The user's tariff configuration, envelope-encrypted. This is the
    /// only persisted form of tariff data.
    pub tariffs_enc: CipherBlob,
}
