// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CacheStats, CandidateProfile, FetchFilters, SwipeKind};
pub use requests::{ConfirmMatchRequest, MatchQueryRequest, SwipeRequest};
pub use responses::{
    ConfirmMatchResponse, MatchCreation, MatchDetails, MatchPage, PageInfo, SwipeReceipt,
    SwipeResponse,
};
