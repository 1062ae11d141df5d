//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers::{analytics, disputes, notifications, system, venues};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Book&Play gateway",
        description = "Admin analytics, dispute handling, venue monitoring and inbox endpoints for the Book&Play futsal marketplace."
    ),
    paths(
        analytics::get_report,
        disputes::list_disputes,
        disputes::get_dispute,
        disputes::update_dispute,
        disputes::user_disputes,
        venues::venue_status,
        notifications::unread_counts,
        notifications::recent_notifications,
        notifications::mark_notifications_read,
        notifications::mark_conversation_read,
        system::health_handler,
        system::system_health_handler,
    ),
    components(schemas(ErrorResponse, ErrorBody)),
    tags(
        (name = "Analytics", description = "Admin dashboard report"),
        (name = "Disputes", description = "Dispute listing and resolution"),
        (name = "Venues", description = "Venue status monitor"),
        (name = "Inbox", description = "Unread counters and read receipts"),
        (name = "System", description = "Liveness and system health"),
    )
)]
pub struct ApiDoc;
