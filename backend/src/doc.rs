//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the request and response payloads and a bearer token security
//! scheme. The document backs Swagger UI in debug builds and is printed by
//! `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::attendance::{
    AttendanceResponse, RegistrationReportResponse, RegistrationReportRow, ReportTeamResponse,
};
use crate::inbound::http::events::{EventCatalogueResponse, EventResponse, TeamSizeResponse};
use crate::inbound::http::payments::{
    InitiatePaymentBody, InitiatedOrderResponse, PaymentDetailsResponse, PaymentStatusResponse,
    PaymentVerifiedResponse, VerifyPaymentBody,
};
use crate::inbound::http::registrations_dto::{
    AccommodationResponse, JoinTeamRequestBody, JoinTeamResponse, MemberResponse,
    RegisterRequestBody, RegistrationResponse, RegistrationStatusResponse, TeamInfoResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token issued by the portal sign-in flow."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "College event portal API",
        description = "Event registration, team formation, and payment-gated activation."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::registrations::register,
        crate::inbound::http::registrations::join_team,
        crate::inbound::http::registrations::registration_status,
        crate::inbound::http::payments::initiate_payment,
        crate::inbound::http::payments::verify_payment,
        crate::inbound::http::payments::payment_status,
        crate::inbound::http::accommodations::list_accommodations,
        crate::inbound::http::attendance::lookup_attendance,
        crate::inbound::http::attendance::mark_present,
        crate::inbound::http::attendance::registration_report,
        crate::inbound::http::events::list_events,
        crate::inbound::http::events::event_details,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequestBody,
        JoinTeamRequestBody,
        RegistrationResponse,
        JoinTeamResponse,
        RegistrationStatusResponse,
        TeamInfoResponse,
        MemberResponse,
        AccommodationResponse,
        InitiatePaymentBody,
        VerifyPaymentBody,
        InitiatedOrderResponse,
        PaymentVerifiedResponse,
        PaymentDetailsResponse,
        PaymentStatusResponse,
        AttendanceResponse,
        RegistrationReportResponse,
        RegistrationReportRow,
        ReportTeamResponse,
        EventCatalogueResponse,
        EventResponse,
        TeamSizeResponse,
    )),
    tags(
        (name = "events", description = "Event catalogue"),
        (name = "registrations", description = "Event registration and team join"),
        (name = "payments", description = "Order creation and payment verification"),
        (name = "accommodations", description = "Accommodation options"),
        (name = "attendance", description = "Venue check-in and reports for administrators"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[rstest]
    #[case("/api/v1/registrations")]
    #[case("/api/v1/registrations/join-team")]
    #[case("/api/v1/registrations/status/{eventId}")]
    #[case("/api/v1/payments/initiate")]
    #[case("/api/v1/payments/verify")]
    #[case("/api/v1/payments/status/{registrationId}")]
    #[case("/api/v1/accommodations")]
    #[case("/api/v1/attendance/{registrationId}")]
    #[case("/api/v1/attendance/{registrationId}/present")]
    #[case("/api/v1/admin/registrations")]
    #[case("/api/v1/events")]
    #[case("/api/v1/events/{eventId}")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn registers_every_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn registration_response_uses_camel_case() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .get("RegistrationResponse")
            .expect("RegistrationResponse schema");

        assert_object_schema_has_field(schema, "registrationId");
        assert_object_schema_has_field(schema, "pendingTeamName");
        assert_object_schema_has_field(schema, "teamInfo");
    }

    #[test]
    fn event_response_exposes_listing_flags() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get("EventResponse").expect("EventResponse schema");

        assert_object_schema_has_field(schema, "regOpen");
        assert_object_schema_has_field(schema, "isRegistrationFull");
        assert_object_schema_has_field(schema, "registrationsCount");
    }

    #[test]
    fn declares_bearer_security_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(matches!(
            components.security_schemes.get("bearerAuth"),
            Some(SecurityScheme::Http(_))
        ));
    }
}
