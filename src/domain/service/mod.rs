pub mod engagement_domain_service;
pub mod enrichment;
pub mod feed_domain_service;
pub mod session_domain_service;

pub use engagement_domain_service::EngagementDomainService;
pub use enrichment::UserEnricher;
pub use feed_domain_service::FeedDomainService;
pub use session_domain_service::SessionDomainService;
