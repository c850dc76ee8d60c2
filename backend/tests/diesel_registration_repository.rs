//! Integration tests for `DieselRegistrationRepository` against embedded PostgreSQL.
//!
//! Each test provisions a fresh database, applies the embedded migrations,
//! seeds users and events through `postgres`, and then drives the repository
//! on a dedicated Tokio runtime.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use pg_embedded_setup_unpriv::TestCluster;
use portal_backend::domain::ports::{
    JoinDraft, RegistrationDraft, RegistrationRepository, RegistrationRepositoryError,
};
use portal_backend::domain::{
    AccommodationId, ActivationState, EventId, FoodPreference, Identity, RegistrationRejection,
    RegistrationStatus, STORED_TEAM_NAME_MAX, TeamAssignment, TeamCode, TeamName, TeamNameChoice,
    UserId, UserRole,
};
use portal_backend::outbound::persistence::{DbPool, DieselRegistrationRepository, PoolConfig};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

#[path = "support/pg_embed.rs"]
mod pg_embed;

mod support;

use pg_embed::test_cluster;
use support::seed::{EventSeed, Seeder};
use support::{handle_cluster_setup_failure, migrate_schema, reset_database};

const TEST_DB: &str = "diesel_registration_repo_test";

struct TestContext {
    runtime: Runtime,
    _cluster: TestCluster,
    repository: DieselRegistrationRepository,
    seeder: Seeder,
    now: DateTime<Utc>,
}

impl TestContext {
    fn register(
        &self,
        draft: &RegistrationDraft,
    ) -> Result<portal_backend::domain::RegistrationOutcome, RegistrationRepositoryError> {
        self.runtime.block_on(self.repository.register(draft))
    }

    fn join(
        &self,
        draft: &JoinDraft,
    ) -> Result<portal_backend::domain::JoinOutcome, RegistrationRepositoryError> {
        self.runtime.block_on(self.repository.join_team(draft))
    }

    fn draft(&self, user: i64, event: i64, team_name: TeamNameChoice) -> RegistrationDraft {
        RegistrationDraft {
            user_id: UserId::new(user),
            event_id: EventId::new(event),
            team_name,
            accommodation_id: None,
            food_preference: FoodPreference::default(),
            now: self.now,
        }
    }

    fn join_draft(&self, user: i64, event: i64, code: &TeamCode) -> JoinDraft {
        JoinDraft {
            user_id: UserId::new(user),
            event_id: EventId::new(event),
            team_code: code.clone(),
            accommodation_id: None,
            food_preference: FoodPreference::default(),
            now: self.now,
        }
    }
}

fn generated(base: &str) -> TeamNameChoice {
    TeamNameChoice::Generated {
        base: base.to_owned(),
    }
}

fn explicit(name: &str) -> TeamNameChoice {
    TeamNameChoice::Explicit(TeamName::parse(name).expect("valid team name"))
}

fn rejection(error: RegistrationRepositoryError) -> RegistrationRejection {
    match error {
        RegistrationRepositoryError::Rejected { rejection } => rejection,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

/// Whether `error` is an acceptable way to lose a race: one of `expected`
/// rejections, or a retryable transaction abort.
fn lost_race(error: &RegistrationRepositoryError, expected: &[RegistrationRejection]) -> bool {
    match error {
        RegistrationRepositoryError::Rejected { rejection } => expected.contains(rejection),
        RegistrationRepositoryError::Conflict { .. } => true,
        _ => false,
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    reset_database(&cluster, TEST_DB)?;
    let database_url = cluster.connection().database_url(TEST_DB);
    migrate_schema(&database_url)?;

    let config = PoolConfig::new(&database_url)
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        _cluster: cluster,
        repository: DieselRegistrationRepository::new(pool),
        seeder: Seeder::connect(&database_url)?,
        now: Utc::now(),
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn free_solo_registrations_count_against_capacity(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: free_solo_registrations_count_against_capacity skipped");
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let grace = ctx.seeder.user("Grace", "student");
    let event = ctx.seeder.event(&EventSeed::solo("Quiz", 0).capped(1));

    let outcome = ctx
        .register(&ctx.draft(ada, event, generated("Ada's Team")))
        .expect("first registration");
    assert!(outcome.payment_status);
    assert_eq!(outcome.team, TeamAssignment::None);
    assert!(!outcome.resumed);

    let again = ctx
        .register(&ctx.draft(ada, event, generated("Ada's Team")))
        .expect_err("paid duplicate");
    assert_eq!(rejection(again), RegistrationRejection::AlreadyRegistered);

    let full = ctx
        .register(&ctx.draft(grace, event, generated("Grace's Team")))
        .expect_err("capacity exhausted");
    assert_eq!(rejection(full), RegistrationRejection::EventFull);
}

#[rstest]
fn paid_team_lead_defers_team_and_resumes(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: paid_team_lead_defers_team_and_resumes skipped");
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let event = ctx.seeder.event(&EventSeed::team("Robo Race", 50_000, 2, 4));

    let first = ctx
        .register(&ctx.draft(ada, event, explicit("Rocket")))
        .expect("lead registration");
    assert!(!first.payment_status);
    assert_eq!(
        first.team,
        TeamAssignment::Pending {
            name: "Rocket".to_owned()
        }
    );
    assert_eq!(ctx.seeder.count("SELECT COUNT(*) FROM teams", &[]), 0);

    let resumed = ctx
        .register(&ctx.draft(ada, event, explicit("Other")))
        .expect("resumed registration");
    assert!(resumed.resumed);
    assert_eq!(resumed.registration_id, first.registration_id);
    assert_eq!(
        resumed.team,
        TeamAssignment::Pending {
            name: "Rocket".to_owned()
        }
    );
    assert_eq!(
        ctx.seeder
            .count("SELECT COUNT(*) FROM registrations WHERE student_id = $1", &[&ada]),
        1
    );

    let status = ctx
        .runtime
        .block_on(ctx.repository.status(UserId::new(ada), EventId::new(event)))
        .expect("status");
    let RegistrationStatus::Registered(snapshot) = status else {
        panic!("expected a registration");
    };
    assert_eq!(
        snapshot.activation,
        ActivationState::UnpaidNoTeam {
            pending_team_name: Some("Rocket".to_owned())
        }
    );
    assert!(snapshot.team.is_none());
}

#[rstest]
fn pending_names_block_explicit_duplicates(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: pending_names_block_explicit_duplicates skipped");
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let grace = ctx.seeder.user("Grace", "student");
    let event = ctx.seeder.event(&EventSeed::team("Robo Race", 50_000, 2, 4));

    ctx.register(&ctx.draft(ada, event, explicit("Rocket")))
        .expect("lead registration");
    let clash = ctx
        .register(&ctx.draft(grace, event, explicit("rocket")))
        .expect_err("case-insensitive clash");
    assert_eq!(rejection(clash), RegistrationRejection::TeamNameTaken);

    let renamed = ctx
        .register(&ctx.draft(grace, event, generated("Rocket")))
        .expect("generated name");
    assert_eq!(
        renamed.team,
        TeamAssignment::Pending {
            name: "Rocket (1)".to_owned()
        }
    );
}

#[rstest]
fn free_team_materializes_and_accepts_joiners(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: free_team_materializes_and_accepts_joiners skipped");
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let grace = ctx.seeder.user("Grace", "student");
    let linus = ctx.seeder.user("Linus", "student");
    let event = ctx.seeder.event(&EventSeed::team("Hackathon", 0, 1, 2));

    let outcome = ctx
        .register(&ctx.draft(ada, event, generated("Ada's Team")))
        .expect("lead registration");
    let TeamAssignment::Active(team) = outcome.team else {
        panic!("free team should be materialized");
    };
    assert_eq!(team.name, "Ada's Team");
    assert_eq!(team.current_members, 1);

    let lowered = TeamCode::parse(team.code.as_ref().to_lowercase()).expect("normalised code");
    let joined = ctx
        .join(&ctx.join_draft(grace, event, &lowered))
        .expect("join");
    assert_eq!(joined.team.current_members, 2);
    assert!(joined.team.is_full());
    assert_eq!(joined.lead.user_id, UserId::new(ada));
    assert_eq!(joined.members.len(), 2);

    let full = ctx
        .join(&ctx.join_draft(linus, event, &team.code))
        .expect_err("team full");
    assert_eq!(rejection(full), RegistrationRejection::TeamFull);

    let own = ctx
        .join(&ctx.join_draft(ada, event, &team.code))
        .expect_err("lead is registered");
    assert_eq!(rejection(own), RegistrationRejection::AlreadyRegistered);
}

#[rstest]
fn join_with_unknown_code_is_rejected(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: join_with_unknown_code_is_rejected skipped");
        return;
    };
    let grace = ctx.seeder.user("Grace", "student");
    let event = ctx.seeder.event(&EventSeed::team("Hackathon", 0, 1, 3));
    let code = TeamCode::parse("ZZZZ99").expect("valid code");

    let missing = ctx
        .join(&ctx.join_draft(grace, event, &code))
        .expect_err("unknown code");
    assert_eq!(rejection(missing), RegistrationRejection::TeamNotFound);
}

#[rstest]
fn closed_windows_and_unknown_accommodations_are_rejected(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: closed_windows_and_unknown_accommodations_are_rejected skipped"
        );
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let closed = ctx
        .seeder
        .event(&EventSeed::solo("Late Quiz", 0).closed_before(ctx.now));
    let open = ctx.seeder.event(&EventSeed::solo("Quiz", 0));

    let late = ctx
        .register(&ctx.draft(ada, closed, generated("Ada's Team")))
        .expect_err("window closed");
    assert_eq!(rejection(late), RegistrationRejection::RegistrationClosed);

    let mut draft = ctx.draft(ada, open, generated("Ada's Team"));
    draft.accommodation_id = Some(AccommodationId::new(999));
    let unknown = ctx.register(&draft).expect_err("unknown accommodation");
    assert_eq!(rejection(unknown), RegistrationRejection::InvalidAccommodation);
    assert_eq!(
        ctx.seeder.count("SELECT COUNT(*) FROM registrations", &[]),
        0
    );
}

#[rstest]
fn accommodations_are_listed_by_name(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: accommodations_are_listed_by_name skipped");
        return;
    };
    ctx.seeder.accommodation("Girls Hostel");
    ctx.seeder.accommodation("Boys Hostel");

    let options = ctx
        .runtime
        .block_on(ctx.repository.accommodations())
        .expect("accommodations");
    let names: Vec<_> = options.iter().map(|option| option.name.as_str()).collect();
    assert_eq!(names, ["Boys Hostel", "Girls Hostel"]);
}

#[rstest]
fn concurrent_duplicates_leave_one_registration(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_duplicates_leave_one_registration skipped");
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let event = ctx.seeder.event(&EventSeed::solo("Quiz", 0));
    let drafts: Vec<_> = (0..3)
        .map(|_| ctx.draft(ada, event, generated("Ada's Team")))
        .collect();

    let results = ctx.runtime.block_on(join_all(
        drafts.iter().map(|draft| ctx.repository.register(draft)),
    ));

    let accepted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(accepted, 1, "{results:?}");
    for error in results.iter().filter_map(|result| result.as_ref().err()) {
        assert!(
            lost_race(error, &[RegistrationRejection::AlreadyRegistered]),
            "unexpected failure: {error:?}"
        );
    }
    assert_eq!(
        ctx.seeder.count(
            "SELECT COUNT(*) FROM registrations WHERE student_id = $1",
            &[&ada]
        ),
        1
    );
}

#[rstest]
fn concurrent_registrations_respect_capacity(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_registrations_respect_capacity skipped");
        return;
    };
    let users = [
        ctx.seeder.user("Ada", "student"),
        ctx.seeder.user("Grace", "student"),
        ctx.seeder.user("Linus", "student"),
    ];
    let event = ctx.seeder.event(&EventSeed::solo("Quiz", 0).capped(2));
    let drafts: Vec<_> = users
        .iter()
        .map(|user| ctx.draft(*user, event, generated("Solo")))
        .collect();

    let results = ctx.runtime.block_on(join_all(
        drafts.iter().map(|draft| ctx.repository.register(draft)),
    ));

    let mut accepted = 0;
    for (draft, result) in drafts.iter().zip(results) {
        match result {
            Ok(_) => accepted += 1,
            Err(RegistrationRepositoryError::Conflict { .. }) => {
                // Aborted transactions leave no row behind; a retry must
                // land on the same capacity check.
                match ctx.register(draft) {
                    Ok(_) => accepted += 1,
                    Err(error) => assert!(
                        lost_race(&error, &[RegistrationRejection::EventFull]),
                        "unexpected retry failure: {error:?}"
                    ),
                }
            }
            Err(error) => assert!(
                lost_race(&error, &[RegistrationRejection::EventFull]),
                "unexpected failure: {error:?}"
            ),
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(
        ctx.seeder.count(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND payment_status",
            &[&event]
        ),
        2
    );
}

#[rstest]
fn concurrent_joins_respect_team_size(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_joins_respect_team_size skipped");
        return;
    };
    let ada = ctx.seeder.user("Ada", "student");
    let joiners = [
        ctx.seeder.user("Grace", "student"),
        ctx.seeder.user("Linus", "student"),
        ctx.seeder.user("Barbara", "student"),
    ];
    let event = ctx.seeder.event(&EventSeed::team("Hackathon", 0, 1, 2));
    let outcome = ctx
        .register(&ctx.draft(ada, event, generated("Ada's Team")))
        .expect("lead registration");
    let TeamAssignment::Active(team) = outcome.team else {
        panic!("free team should be materialized");
    };
    let drafts: Vec<_> = joiners
        .iter()
        .map(|user| ctx.join_draft(*user, event, &team.code))
        .collect();

    let results = ctx.runtime.block_on(join_all(
        drafts.iter().map(|draft| ctx.repository.join_team(draft)),
    ));

    let joined = results.iter().filter(|result| result.is_ok()).count();
    assert!(joined <= 1, "{results:?}");
    for error in results.iter().filter_map(|result| result.as_ref().err()) {
        assert!(
            lost_race(error, &[RegistrationRejection::TeamFull]),
            "unexpected failure: {error:?}"
        );
    }
    let members = ctx.seeder.count(
        "SELECT COUNT(*) FROM team_registrations tr \
         JOIN teams t ON t.team_id = tr.team_id WHERE t.event_id = $1",
        &[&event],
    );
    assert!(members <= 2, "team grew to {members} members");
    assert_eq!(
        members,
        1 + i64::try_from(joined).expect("small count"),
        "every accepted join owns exactly one membership row"
    );
}

#[rstest]
fn long_display_names_still_form_a_team(repo_context: Option<TestContext>) {
    let Some(mut ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: long_display_names_still_form_a_team skipped");
        return;
    };
    let name = "x".repeat(200);
    let lead = ctx.seeder.user(&name, "student");
    let event = ctx.seeder.event(&EventSeed::team("Hackathon", 0, 1, 3));
    let identity = Identity {
        user_id: UserId::new(lead),
        name,
        email: "long@college.test".to_owned(),
        role: UserRole::Student,
    };

    let outcome = ctx
        .register(&ctx.draft(lead, event, generated(&identity.default_team_name())))
        .expect("registration with a clamped team name");
    let TeamAssignment::Active(team) = outcome.team else {
        panic!("free team should be materialized");
    };
    assert!(team.name.chars().count() <= STORED_TEAM_NAME_MAX);
    assert!(team.name.ends_with("'s Team"));
}
