mod client_ctx;

pub use client_ctx::{
    person_id_from_header, ClientCtx, ClientCtxInner, IdentityError, PERSON_ID_HEADER,
    SESSION_PERSON_KEY,
};
