//! Catalog client tests
//!
//! Title resolution through the search service and subtitle listings for
//! movies and series, against a mocked Ktuvit.me.

use mockito::{Matcher, Server};
use serde_json::{json, Value};

use ktuvit_subs::{Credentials, KtuvitClient, MediaKind, PasswordCipher, SaltedAesCipher, SearchQuery};

const SEARCH_PATH: &str = "/Services/ContentProvider.svc/SearchPage_search";
const LOGIN_PATH: &str = "/Services/MembershipService.svc/Login";
const SERIES_PATH: &str = "/Services/GetModuleAjax.ashx";
const SALT: &str = "5A1B2C3D4E";

/// Wrap `inner` the way the catalog does: `{"d": "<json string>"}`
fn envelope(inner: Value) -> String {
    json!({ "d": inner.to_string() }).to_string()
}

fn subtitle_row(title: &str, id: &str) -> String {
    format!(
        "<tr>\n  <td><div style=\"float: right; width: 95%;\">\n    {}<br />\n    <small>uploader</small></div></td>\n  <td><a class=\"fa fa-download\" data-subtitle-id=\"{}\"></a></td>\n</tr>\n",
        title, id
    )
}

fn home_page() -> String {
    format!(
        "<html><head><script>\n var encryptionSalt = '{}';\n</script></head><body></body></html>",
        SALT
    )
}

// =============================================================================
// Identity Resolution
// =============================================================================

#[tokio::test]
async fn test_resolve_identifier_nested_envelope() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", SEARCH_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"d": "{\"Films\":[{\"ID\":\"123\",\"ImdbID\":\"tt000111\"}]}"}"#)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("Some Film", MediaKind::Movie, Some("tt000111"))
        .await;

    mock.assert_async().await;
    assert_eq!(id.as_deref(), Some("123"));
}

#[tokio::test]
async fn test_resolve_sends_search_request_fields() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", SEARCH_PATH)
        .match_body(Matcher::PartialJson(json!({
            "request": {
                "FilmName": "Breaking Bad",
                "SearchType": 1,
                "Page": 1,
                "Year": "",
                "WithSubsOnly": false,
                "Actors": [],
                "Studios": null
            }
        })))
        .with_status(200)
        .with_body(envelope(json!({ "Films": [] })))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("Breaking Bad", MediaKind::Series, Some("tt0903747"))
        .await;

    mock.assert_async().await;
    assert!(id.is_none());
}

#[tokio::test]
async fn test_resolve_first_match_wins() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", SEARCH_PATH)
        .with_status(200)
        .with_body(envelope(json!({
            "Films": [
                { "ID": "1", "ImdbID": "tt0000001" },
                { "ID": "2", "ImdbID": "tt0903747" },
                { "ID": "3", "ImdbID": "tt0903747" }
            ]
        })))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("Breaking Bad", MediaKind::Series, Some("tt0903747"))
        .await;

    assert_eq!(id.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_resolve_through_imdb_link() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", SEARCH_PATH)
        .with_status(200)
        .with_body(envelope(json!({
            "Films": [
                { "ID": "10", "ImdbID": null, "IMDB_Link": "https://www.imdb.com/title/tt7777777/" },
                { "ID": "11", "ImdbID": "", "IMDB_Link": "https://www.imdb.com/title/tt0133093/" }
            ]
        })))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("The Matrix", MediaKind::Movie, Some("tt0133093"))
        .await;

    assert_eq!(id.as_deref(), Some("11"));
}

#[tokio::test]
async fn test_resolve_no_match_is_none() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", SEARCH_PATH)
        .with_status(200)
        .with_body(envelope(json!({ "Films": [{ "ID": "1", "ImdbID": "tt0000001" }] })))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("Unknown", MediaKind::Movie, Some("tt9999999"))
        .await;

    assert!(id.is_none());
}

#[tokio::test]
async fn test_resolve_null_films_is_none() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", SEARCH_PATH)
        .with_status(200)
        .with_body(envelope(json!({ "Films": null })))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("Unknown", MediaKind::Movie, Some("tt9999999"))
        .await;

    assert!(id.is_none());
}

#[tokio::test]
async fn test_resolve_server_error_is_none() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", SEARCH_PATH)
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client
        .resolve_identifier("Anything", MediaKind::Movie, Some("tt0000001"))
        .await;

    mock.assert_async().await;
    assert!(id.is_none());
}

#[tokio::test]
async fn test_resolve_malformed_envelopes_are_none() {
    for body in [
        "<html>maintenance</html>".to_string(),
        r#"{"d": null}"#.to_string(),
        r#"{"d": "not json"}"#.to_string(),
    ] {
        let mut server = Server::new_async().await;
        server
            .mock("POST", SEARCH_PATH)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
        let id = client
            .resolve_identifier("Anything", MediaKind::Movie, Some("tt0000001"))
            .await;
        assert!(id.is_none());
    }
}

#[tokio::test]
async fn test_resolve_without_imdb_id_skips_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("POST", SEARCH_PATH)
        .expect(0)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let id = client.resolve_identifier("Anything", MediaKind::Movie, None).await;

    mock.assert_async().await;
    assert!(id.is_none());
}

// =============================================================================
// Series Listings
// =============================================================================

#[tokio::test]
async fn test_series_subtitles() {
    let mut server = Server::new_async().await;

    let html = format!(
        "<table>{}{}{}{}</table>",
        subtitle_row("Breaking.Bad.S01E05.720p", "AABBCCDDEEFF00112233445566778899"),
        subtitle_row("Breaking.Bad.S01E05.zip", "11111111111111111111111111111111"),
        subtitle_row("Breaking.Bad.S01E05.HDTV", "22222222222222222222222222222222"),
        subtitle_row("Breaking.Bad.S01E05.720p.dup", "AABBCCDDEEFF00112233445566778899"),
    );

    let mock = server
        .mock("GET", SERIES_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("moduleName".into(), "SubtitlesList".into()),
            Matcher::UrlEncoded("SeriesID".into(), "555".into()),
            Matcher::UrlEncoded("Season".into(), "1".into()),
            Matcher::UrlEncoded("Episode".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let results = client.series_subtitles("555", 1, 5).await;

    mock.assert_async().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Breaking.Bad.S01E05.720p");
    assert_eq!(results[0].id, "AABBCCDDEEFF00112233445566778899:555");
    assert_eq!(results[1].title, "Breaking.Bad.S01E05.HDTV");
    assert!(results.iter().all(|r| r.language == "he" && r.author == "Ktuvit.me"));
}

#[tokio::test]
async fn test_series_listing_error_is_empty() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", SERIES_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    assert!(client.series_subtitles("555", 1, 5).await.is_empty());
}

#[tokio::test]
async fn test_get_subtitles_for_episode() {
    let mut server = Server::new_async().await;

    let search = server
        .mock("POST", SEARCH_PATH)
        .match_body(Matcher::PartialJson(json!({ "request": { "SearchType": 1 } })))
        .with_status(200)
        .with_body(envelope(json!({
            "Films": [{ "ID": "900", "IMDB_Link": "https://www.imdb.com/title/tt0903747/" }]
        })))
        .create_async()
        .await;

    let listing = server
        .mock("GET", SERIES_PATH)
        .match_query(Matcher::UrlEncoded("SeriesID".into(), "900".into()))
        .with_status(200)
        .with_body(subtitle_row("Breaking.Bad.S02E03", "ABCDEFABCDEFABCDEFABCDEFABCDEFAB"))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let query = SearchQuery::episode("Breaking Bad", "tt0903747", 2, 3);
    let results = client.get_subtitles(&query).await;

    search.assert_async().await;
    listing.assert_async().await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "ABCDEFABCDEFABCDEFABCDEFABCDEFAB:900");
}

#[tokio::test]
async fn test_get_subtitles_unresolved_title_is_empty() {
    let mut server = Server::new_async().await;

    server
        .mock("POST", SEARCH_PATH)
        .with_status(200)
        .with_body(envelope(json!({ "Films": [] })))
        .create_async()
        .await;
    let listing = server
        .mock("GET", SERIES_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let results = client
        .get_subtitles(&SearchQuery::episode("Nothing", "tt0000001", 1, 1))
        .await;

    listing.assert_async().await;
    assert!(results.is_empty());
}

// =============================================================================
// Movie Listings
// =============================================================================

#[tokio::test]
async fn test_movie_subtitles_without_credentials_skip_network() {
    let mut server = Server::new_async().await;

    let home = server.mock("GET", "/").expect(0).create_async().await;
    let page = server
        .mock("GET", "/MovieInfo.aspx")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::default());
    let results = client.movie_subtitles("123").await;

    home.assert_async().await;
    page.assert_async().await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_movie_subtitles_authenticate_then_scrape() {
    let mut server = Server::new_async().await;
    let credentials = Credentials::new("me@example.com", "secret");
    let encrypted = SaltedAesCipher
        .encrypt("me@example.com", "secret", SALT)
        .unwrap();

    let home = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(home_page())
        .create_async()
        .await;
    let login = server
        .mock("POST", LOGIN_PATH)
        .match_body(Matcher::PartialJson(json!({
            "request": { "Email": "me@example.com", "Password": encrypted }
        })))
        .with_status(200)
        .with_header("set-cookie", "Login=token; Path=/")
        .with_body(envelope(json!({ "IsSuccess": true, "ErrorMessage": null })))
        .create_async()
        .await;
    let page = server
        .mock("GET", "/MovieInfo.aspx")
        .match_query(Matcher::UrlEncoded("ID".into(), "123".into()))
        .with_status(200)
        .with_body(format!(
            "<table>{}{}</table>",
            subtitle_row("The.Matrix.1999.1080p", "0123456789ABCDEF0123456789ABCDEF"),
            subtitle_row("The.Matrix.1999.720p", "FEDCBA9876543210FEDCBA9876543210"),
        ))
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), credentials);
    let results = client.movie_subtitles("123").await;

    home.assert_async().await;
    login.assert_async().await;
    page.assert_async().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "The.Matrix.1999.1080p");
    assert_eq!(results[0].id, "0123456789ABCDEF0123456789ABCDEF:123");
    assert_eq!(results[1].id, "FEDCBA9876543210FEDCBA9876543210:123");
}

#[tokio::test]
async fn test_movie_subtitles_failed_login_is_empty() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/")
        .with_status(200)
        .with_body(home_page())
        .create_async()
        .await;
    server
        .mock("POST", LOGIN_PATH)
        .with_status(200)
        .with_body(envelope(json!({ "IsSuccess": false, "ErrorMessage": "Wrong password" })))
        .create_async()
        .await;
    let page = server
        .mock("GET", "/MovieInfo.aspx")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::new("me@example.com", "bad"));
    let results = client.get_subtitles(&SearchQuery::movie("The Matrix", "tt0133093")).await;

    page.assert_async().await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_every_movie_lookup_reauthenticates() {
    let mut server = Server::new_async().await;

    let home = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(home_page())
        .expect(2)
        .create_async()
        .await;
    let login = server
        .mock("POST", LOGIN_PATH)
        .with_status(200)
        .with_body(envelope(json!({ "IsSuccess": true })))
        .expect(2)
        .create_async()
        .await;
    server
        .mock("GET", "/MovieInfo.aspx")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(subtitle_row("Film.2020", "0123456789ABCDEF0123456789ABCDEF"))
        .expect(2)
        .create_async()
        .await;

    let client = KtuvitClient::with_base_url(server.url(), Credentials::new("me@example.com", "pw"));
    assert_eq!(client.movie_subtitles("1").await.len(), 1);
    assert_eq!(client.movie_subtitles("1").await.len(), 1);

    home.assert_async().await;
    login.assert_async().await;
}
