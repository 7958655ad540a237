// End-to-end: resolver over a real SQLite file and an HTTP provider

use cnpj_registry::{
    validate, HttpLookupProvider, ProviderError, ResolveError, Resolver, SqliteStore, Store,
};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn company_payload() -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "cnpj": "11.222.333/0001-81",
        "nome": "EMPRESA TESTE LTDA",
        "fantasia": "TESTE",
        "logradouro": "RUA XV DE NOVEMBRO",
        "numero": "50",
        "complemento": "SALA 2",
        "cep": "80.020-310",
        "bairro": "CENTRO",
        "municipio": "CURITIBA",
        "uf": "PR",
        "email": "",
        "telefone": "(41) 3000-0000",
        "efr": "",
        "situacao": "ATIVA"
    })
}

fn setup(server: &MockServer) -> (Resolver, Arc<SqliteStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("companies.db")).unwrap());
    let provider = Arc::new(HttpLookupProvider::new(&server.uri(), None).unwrap());
    let resolver = Resolver::new(store.clone(), provider);
    (resolver, store, dir)
}

#[test]
fn test_scenario_valid_id() {
    assert!(validate("11.222.333/0001-81"));
}

#[tokio::test]
async fn test_scenario_wrong_check_digits_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(company_payload()))
        .expect(0)
        .mount(&server)
        .await;

    let (resolver, store, _dir) = setup(&server);

    assert!(!validate("11.222.333/0001-00"));
    let err = resolver.resolve("11.222.333/0001-00").await.unwrap_err();

    assert!(matches!(err, ResolveError::RejectedInput { .. }));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_scenario_fetch_store_and_serve_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/registry/11222333000181"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(company_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let (resolver, store, _dir) = setup(&server);

    let first = resolver.resolve("11.222.333/0001-81").await.unwrap();
    assert_eq!(first.registry_id, "11.222.333/0001-81");
    assert_eq!(first.name, "EMPRESA TESTE LTDA");
    assert_eq!(first.municipality, "CURITIBA");
    assert!(first.id.is_some());
    assert_eq!(store.count().await.unwrap(), 1);

    // second call must not reach the provider (expect(1) is verified on drop)
    let second = resolver.resolve("11.222.333/0001-81").await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.name, first.name);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_scenario_provider_failure_leaves_store_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/registry/11222333000181"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (resolver, store, _dir) = setup(&server);

    let err = resolver.resolve("11.222.333/0001-81").await.unwrap_err();

    assert!(matches!(
        err,
        ResolveError::ProviderFailure(ProviderError::Status { status: 500, .. })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_provider_is_provider_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("companies.db")).unwrap());
    // grab a free port, then close it so the connection is refused
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let base_url = format!("http://127.0.0.1:{}", port);
    let provider = Arc::new(HttpLookupProvider::new(&base_url, None).unwrap());
    let resolver = Resolver::new(store.clone(), provider);

    let err = resolver.resolve("11.444.777/0001-61").await.unwrap_err();

    assert!(matches!(
        err,
        ResolveError::ProviderFailure(ProviderError::Transport(_))
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unpunctuated_spelling_is_a_separate_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/registry/11222333000181"))
        .respond_with(ResponseTemplate::new(200).set_body_json(company_payload()))
        .expect(2)
        .mount(&server)
        .await;

    let (resolver, store, _dir) = setup(&server);

    resolver.resolve("11.222.333/0001-81").await.unwrap();
    let compact = resolver.resolve("112223330001-81").await.unwrap();

    assert_eq!(compact.registry_id, "112223330001-81");
    assert_eq!(store.count().await.unwrap(), 2);
}
