//! End-to-end planning tests against a real on-disk content store.
//!
//! These exercise the public API the CLI uses: config in, concatenated build
//! plan and rendered Dockerfile out.

use layerplan_core::{
    plan_python_environment, plan_requirement_install, BuildPlan, ImageTarget, LocalContentStore,
    PlanConfig, PlanError, PythonRepos, PythonSetup,
};
use tempfile::TempDir;

struct Fixture {
    root: TempDir,
    _store_dir: TempDir,
    store: LocalContentStore,
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    let store = LocalContentStore::new(root.path(), store_dir.path()).unwrap();
    Fixture { root, _store_dir: store_dir, store }
}

fn offline_config() -> PlanConfig {
    PlanConfig { repos: PythonRepos::offline(), ..PlanConfig::default() }
}

#[tokio::test]
async fn test_plan_without_constraints() {
    let fx = fixture();
    let requirements = ["flask==2.0", "gunicorn"];
    let plan = plan_python_environment(&offline_config(), &requirements, Some(true), &fx.store)
        .await
        .unwrap();

    assert_eq!(
        plan.commands,
        vec![
            "python -m venv --upgrade /.virtual_env\n",
            "ENV PATH=/.virtual_env/bin:$PATH\n",
            "ENV VIRTUAL_ENV=/.virtual_env\n",
            "python -m pip install --upgrade pip\n",
            "python -m pip install  --no-index    flask==2.0\n",
            "python -m pip install  --no-index    gunicorn\n",
        ]
    );
    assert!(plan.sources.is_empty());
}

#[tokio::test]
async fn test_plan_with_constraints() {
    let fx = fixture();
    std::fs::write(fx.root.path().join("constraints.txt"), "flask<3\n").unwrap();

    let mut config = PlanConfig::default();
    config.python.requirement_constraints = Some("constraints.txt".to_string());

    let plan = plan_python_environment(&config, &["flask"], None, &fx.store).await.unwrap();

    let copy = plan.commands.iter().position(|c| c.starts_with("COPY ")).unwrap();
    let upgrade = plan.commands.iter().position(|c| c.contains("--upgrade pip")).unwrap();
    assert!(copy < upgrade);
    assert!(plan.commands[upgrade].ends_with(" -c constraints.txt\n"));
    assert_eq!(
        plan.commands.last().unwrap(),
        "python -m pip install --index-url https://pypi.org/simple/  \
         --constraint constraints.txt flask\n"
    );
    assert_eq!(plan.source_files(), vec!["constraints.txt"]);
}

#[tokio::test]
async fn test_missing_constraints_names_option() {
    let fx = fixture();
    let mut config = PlanConfig::default();
    config.python.requirement_constraints = Some("constraints.txt".to_string());

    let err = plan_python_environment(&config, &["flask"], None, &fx.store).await.unwrap_err();
    assert!(matches!(err, PlanError::MissingInputFile { .. }));
    assert!(err.to_string().contains("`requirement_constraints`"));
}

#[tokio::test]
async fn test_resolves_fail_fast() {
    let fx = fixture();
    let mut config = PlanConfig::default();
    config.python.enable_resolves = true;
    // Would be a MissingInputFile if the store were consulted
    config.python.requirement_constraints = Some("constraints.txt".to_string());

    let err = plan_python_environment(&config, &["flask"], None, &fx.store).await.unwrap_err();
    assert!(matches!(err, PlanError::UnimplementedFeature { .. }));
}

#[tokio::test]
async fn test_dockerfile_and_context() {
    let fx = fixture();
    std::fs::write(fx.root.path().join("constraints.txt"), "flask<3\n").unwrap();

    let mut config = offline_config();
    config.python.requirement_constraints = Some("constraints.txt".to_string());
    let mut target = ImageTarget::new("webapp", "python:3.11-slim");
    target.command = vec!["flask".to_string(), "run".to_string()];

    let plan = plan_python_environment(&config, &["flask"], Some(false), &fx.store).await.unwrap();
    let dockerfile = target.render_dockerfile(&plan).unwrap();

    assert!(dockerfile.starts_with("FROM python:3.11-slim\nCOPY application/constraints.txt .\n"));
    assert!(dockerfile.ends_with("WORKDIR /container\nCMD [\"flask\",\"run\"]\n"));

    let out = TempDir::new().unwrap();
    let application = out.path().join("application");
    for handle in &plan.sources {
        fx.store.materialize(handle, &application).await.unwrap();
    }
    let copied = std::fs::read_to_string(application.join("constraints.txt")).unwrap();
    assert_eq!(copied, "flask<3\n");
}

#[test]
fn test_plans_concatenate_in_caller_order() {
    let setup = PythonSetup::default();
    let repos = PythonRepos::offline();
    let first = plan_requirement_install(&["a"], &setup, &repos, false).unwrap();
    let second = plan_requirement_install(&["b"], &setup, &repos, false).unwrap();

    let plan = BuildPlan::from_components([second, first]);
    assert!(plan.commands[0].ends_with(" b\n"));
    assert!(plan.commands[1].ends_with(" a\n"));
}
