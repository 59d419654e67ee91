use flock_database::Database;
use flock_domain::config::ApiConfig;
use flock_kernel::server::ApiState;

#[derive(Debug)]
struct Widgets;

impl flock_domain::registry::FeatureSlice for Widgets {
    fn name(&self) -> &'static str {
        "widgets"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn build_requires_config_and_database() {
    let err = ApiState::builder().build().unwrap_err();
    assert_eq!(err.kind(), "Validation");
}

#[tokio::test]
async fn registered_slices_are_reachable_by_type() {
    let db = Database::builder().url("mem://").session("flock", "state").init().await.unwrap();
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .db(db)
        .register_slice(flock_domain::registry::InitializedSlice::new(Widgets))
        .build()
        .unwrap();

    assert!(state.slice::<Widgets>().is_ok());
    assert_eq!(state.slice_names(), vec!["widgets"]);
}

#[derive(Debug)]
struct Absent;

impl flock_domain::registry::FeatureSlice for Absent {
    fn name(&self) -> &'static str {
        "absent"
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[tokio::test]
async fn missing_and_duplicate_slices_are_reported() {
    let db = Database::builder().url("mem://").session("flock", "state").init().await.unwrap();
    let state = ApiState::builder().config(ApiConfig::default()).db(db.clone()).build().unwrap();
    assert_eq!(state.slice::<Absent>().unwrap_err().kind(), "MissingSlice");

    let err = ApiState::builder()
        .config(ApiConfig::default())
        .db(db)
        .register_slices([
            flock_domain::registry::InitializedSlice::new(Widgets),
            flock_domain::registry::InitializedSlice::new(Widgets),
        ])
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), "Validation");
    assert!(err.to_string().contains("widgets"));
}
