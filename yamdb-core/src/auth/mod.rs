pub mod confirmation;
pub mod crypto;
pub mod policy;
pub mod tokens;

pub use confirmation::ConfirmationCodes;
pub use crypto::{AuthCrypto, AuthCryptoError};
pub use policy::{Access, AccessPolicy, Denied};
pub use tokens::{AccessTokens, Claims, TokenError};
