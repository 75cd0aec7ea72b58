/// Payload for creating a new account.
///
/// Role is never part of the payload; every account is created as a
/// regular user and promoted separately.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}
