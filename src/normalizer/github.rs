//! GitHub notifications, activity streams and issue searches.
//!
//! All requests go to the REST API with the user's decrypted token.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{GithubMode, Item, Normalized, Profile, Source, SourceMeta};
use crate::fetcher::{fetch_json, Request};
use crate::media;
use crate::normalizer::finish_source;
use crate::skip::{should_skip, Candidate};

const WEB_URL: &str = "https://github.com";
const PER_PAGE: &str = "50";

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
    html_url: String,
    owner: Account,
}

#[derive(Debug, Deserialize)]
struct Notification {
    id: String,
    reason: String,
    updated_at: DateTime<Utc>,
    subject: Subject,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct Subject {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Event {
    id: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    actor: Actor,
    repo: EventRepo,
    #[serde(default)]
    payload: Value,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Actor {
    login: String,
    #[serde(default)]
    display_login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventRepo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    id: u64,
    number: u64,
    title: String,
    html_url: String,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    user: Option<Account>,
    #[serde(default)]
    body: Option<String>,
}

/// Title, link and optional body of one formatted event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventText {
    pub title: String,
    pub link: String,
    pub body: Option<String>,
}

/// Data every mode produces before items are built. Entries stay raw JSON
/// so one malformed element only drops itself.
struct Listing {
    canonical: String,
    title: String,
    link: String,
    icon: Option<String>,
    entries: Vec<Value>,
}

struct Api<'a> {
    ctx: &'a AppContext,
    base: &'a str,
    token: String,
}

impl Api<'_> {
    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = format!("{}{}", self.base.trim_end_matches('/'), path);
        if params.is_empty() {
            return Ok(Url::parse(&base)?);
        }
        Ok(Url::parse_with_params(&base, params)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let request = Request::get(url.as_str(), self.ctx.config.fetch.timeout())
            .bearer(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        fetch_json(&*self.ctx.fetcher, request).await
    }
}

pub async fn normalize(
    ctx: &AppContext,
    profile: &Profile,
    source: &Source,
    mode: &GithubMode,
) -> Result<Normalized> {
    let token = profile
        .account_github
        .as_ref()
        .map(|account| account.token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| TributaryError::validation("GitHub account is not connected"))?;

    let api = Api {
        ctx,
        base: &ctx.config.github.api_url,
        token: ctx.secrets.decrypt(token)?,
    };

    match mode {
        GithubMode::Notifications { participating } => {
            let listing = notifications(&api, *participating).await?;
            build::<Notification>(ctx, source, listing, notification_item).await
        }
        GithubMode::RepositoryNotifications { repository, participating } => {
            let listing = repository_notifications(&api, repository, *participating).await?;
            build::<Notification>(ctx, source, listing, notification_item).await
        }
        GithubMode::SearchIssuesAndPullRequests { query_name, query } => {
            let listing = search(&api, query_name, query).await?;
            build::<Issue>(ctx, source, listing, issue_item).await
        }
        GithubMode::UserActivities { user } => {
            let listing = user_activities(&api, user).await?;
            build::<Event>(ctx, source, listing, event_item).await
        }
        GithubMode::RepositoryActivities { repository } => {
            let listing = repository_activities(&api, repository).await?;
            build::<Event>(ctx, source, listing, event_item).await
        }
        GithubMode::OrganizationActivities { organization } => {
            let listing = organization_activities(&api, organization).await?;
            build::<Event>(ctx, source, listing, event_item).await
        }
    }
}

async fn notifications(api: &Api<'_>, participating: bool) -> Result<Listing> {
    let participating_param = participating.to_string();
    let notifications_url = api.url(
        "/notifications",
        &[("participating", participating_param.as_str()), ("per_page", PER_PAGE)],
    )?;
    let user_url = api.url("/user", &[])?;

    let (entries, user): (Vec<Value>, Account) =
        futures::try_join!(api.get(notifications_url), api.get(user_url))?;

    Ok(Listing {
        canonical: format!("notifications-{participating}"),
        title: "Notifications".to_string(),
        link: format!("{WEB_URL}/notifications"),
        icon: user.avatar_url,
        entries,
    })
}

async fn repository_notifications(
    api: &Api<'_>,
    repository: &str,
    participating: bool,
) -> Result<Listing> {
    let participating_param = participating.to_string();
    let notifications_url = api.url(
        &format!("/repos/{repository}/notifications"),
        &[("participating", participating_param.as_str()), ("per_page", PER_PAGE)],
    )?;
    let repo_url = api.url(&format!("/repos/{repository}"), &[])?;

    let (entries, repo): (Vec<Value>, Repository) =
        futures::try_join!(api.get(notifications_url), api.get(repo_url))?;

    Ok(Listing {
        canonical: format!("repositorynotifications-{repository}-{participating}"),
        title: repo.full_name,
        link: repo.html_url,
        icon: repo.owner.avatar_url,
        entries,
    })
}

async fn search(api: &Api<'_>, query_name: &str, query: &str) -> Result<Listing> {
    let url = api.url(
        "/search/issues",
        &[
            ("q", query),
            ("sort", "updated"),
            ("order", "desc"),
            ("per_page", PER_PAGE),
        ],
    )?;
    let result: SearchResult = api.get(url).await?;
    let link = Url::parse_with_params(&format!("{WEB_URL}/issues"), &[("q", query)])?;

    Ok(Listing {
        canonical: format!("searchissuesandpullrequests-{query}"),
        title: query_name.to_string(),
        link: link.to_string(),
        icon: None,
        entries: result.items,
    })
}

async fn user_activities(api: &Api<'_>, user: &str) -> Result<Listing> {
    let events_url = api.url(&format!("/users/{user}/received_events"), &[("per_page", PER_PAGE)])?;
    let user_url = api.url(&format!("/users/{user}"), &[])?;

    let (entries, account): (Vec<Value>, Account) =
        futures::try_join!(api.get(events_url), api.get(user_url))?;

    Ok(Listing {
        canonical: format!("useractivities-{user}"),
        link: account
            .html_url
            .unwrap_or_else(|| format!("{WEB_URL}/{}", account.login)),
        title: account.login,
        icon: account.avatar_url,
        entries,
    })
}

async fn repository_activities(api: &Api<'_>, repository: &str) -> Result<Listing> {
    let events_url = api.url(&format!("/repos/{repository}/events"), &[("per_page", PER_PAGE)])?;
    let repo_url = api.url(&format!("/repos/{repository}"), &[])?;

    let (entries, repo): (Vec<Value>, Repository) =
        futures::try_join!(api.get(events_url), api.get(repo_url))?;

    Ok(Listing {
        canonical: format!("repositoryactivities-{repository}"),
        title: repo.full_name,
        link: repo.html_url,
        icon: repo.owner.avatar_url,
        entries,
    })
}

async fn organization_activities(api: &Api<'_>, organization: &str) -> Result<Listing> {
    let events_url = api.url(&format!("/orgs/{organization}/events"), &[("per_page", PER_PAGE)])?;
    let org_url = api.url(&format!("/orgs/{organization}"), &[])?;

    let (entries, org): (Vec<Value>, Account) =
        futures::try_join!(api.get(events_url), api.get(org_url))?;

    Ok(Listing {
        canonical: format!("organizationactivities-{organization}"),
        link: org
            .html_url
            .unwrap_or_else(|| format!("{WEB_URL}/{}", org.login)),
        title: org.login,
        icon: org.avatar_url,
        entries,
    })
}

/// Fields an item is built from, in the order the skip rules check them.
struct Entry {
    identifier: String,
    title: String,
    link: String,
    timestamp: DateTime<Utc>,
    description: Option<String>,
    author: Option<String>,
}

async fn build<T: DeserializeOwned>(
    ctx: &AppContext,
    source: &Source,
    listing: Listing,
    to_entry: fn(&T) -> Option<Entry>,
) -> Result<Normalized> {
    let source = finish_source(
        ctx,
        source,
        SourceMeta {
            id: source.id_for(&listing.canonical),
            title: listing.title,
            link: Some(listing.link),
            icon: listing.icon,
            options: None,
        },
    )
    .await;

    let updated_at = source.last_updated();
    let mut items = Vec::new();
    for (index, raw) in listing.entries.into_iter().enumerate() {
        let parsed: T = match serde_json::from_value(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Dropping malformed GitHub entry {} of {}: {}", index, source.id, e);
                continue;
            }
        };
        let Some(entry) = to_entry(&parsed) else {
            continue;
        };
        let candidate = Candidate::new(
            Some(entry.title.as_str()),
            Some(entry.link.as_str()),
            Some(entry.timestamp),
        );
        if should_skip(index, &candidate, updated_at) {
            continue;
        }

        let mut item = Item::new(&source, &entry.identifier, entry.timestamp.timestamp());
        item.title = Some(entry.title);
        item.link = Some(entry.link);
        item.description = entry.description;
        item.author = entry.author;
        items.push(item);
    }

    Ok(Normalized { source, items })
}

fn notification_item(notification: &Notification) -> Option<Entry> {
    let link = notification
        .subject
        .url
        .as_deref()
        .and_then(|url| html_url(url, &notification.repository.html_url))
        .unwrap_or_else(|| notification.repository.html_url.clone());

    Some(Entry {
        identifier: notification.id.clone(),
        title: notification.subject.title.clone(),
        link,
        timestamp: notification.updated_at,
        description: Some(format!(
            "{}: {}",
            notification.subject.kind,
            notification.reason.replace('_', " ")
        )),
        author: Some(notification.repository.full_name.clone()),
    })
}

fn issue_item(issue: &Issue) -> Option<Entry> {
    Some(Entry {
        identifier: issue.id.to_string(),
        title: format!("#{} {}", issue.number, issue.title),
        link: issue.html_url.clone(),
        timestamp: issue.updated_at,
        description: issue.body.as_deref().map(str::trim).filter(|b| !b.is_empty()).map(String::from),
        author: issue.user.as_ref().map(|user| user.login.clone()),
    })
}

fn event_item(event: &Event) -> Option<Entry> {
    let text = format_event(event)?;
    Some(Entry {
        identifier: event.id.clone(),
        title: text.title,
        link: text.link,
        timestamp: event.created_at,
        description: text.body.map(|body| media::strip_html(&body)).filter(|b| !b.is_empty()),
        author: Some(actor_name(&event.actor).to_string()),
    })
}

/// Web url of an API url, e.g. `https://api.github.com/repos/o/r/pulls/1`
/// becomes `https://github.com/o/r/pull/1`. Releases point to the release
/// list since the API url carries only the release id.
pub fn html_url(api_url: &str, repository_url: &str) -> Option<String> {
    let url = Url::parse(api_url).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["repos", owner, repo, "pulls", number, ..] => Some(format!("{WEB_URL}/{owner}/{repo}/pull/{number}")),
        ["repos", owner, repo, "issues", number, ..] => Some(format!("{WEB_URL}/{owner}/{repo}/issues/{number}")),
        ["repos", owner, repo, "commits", sha, ..] => Some(format!("{WEB_URL}/{owner}/{repo}/commit/{sha}")),
        ["repos", _, _, "releases", ..] => Some(format!("{}/releases", repository_url.trim_end_matches('/'))),
        ["repos", owner, repo, "discussions", number, ..] => {
            Some(format!("{WEB_URL}/{owner}/{repo}/discussions/{number}"))
        }
        ["repos", owner, repo, rest @ ..] => {
            let rest = rest.join("/");
            if rest.is_empty() {
                Some(format!("{WEB_URL}/{owner}/{repo}"))
            } else {
                Some(format!("{WEB_URL}/{owner}/{repo}/{rest}"))
            }
        }
        _ => None,
    }
}

fn actor_name(actor: &Actor) -> &str {
    actor.display_login.as_deref().unwrap_or(&actor.login)
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(Value::as_u64)
}

/// Human readable title and link of an event. Unknown event types yield
/// `None`.
pub fn format_event_parts(kind: &str, actor: &str, repo: &str, payload: &Value) -> Option<EventText> {
    let repo_url = format!("{WEB_URL}/{repo}");
    let action = str_at(payload, "/action").unwrap_or("updated");

    let text = match kind {
        "CommitCommentEvent" => EventText {
            title: format!("{actor} commented on a commit in {repo}"),
            link: str_at(payload, "/comment/html_url").map(String::from).unwrap_or(repo_url),
            body: str_at(payload, "/comment/body").map(String::from),
        },
        "CreateEvent" => {
            let ref_type = str_at(payload, "/ref_type").unwrap_or("repository");
            match (ref_type, str_at(payload, "/ref")) {
                ("repository", _) | (_, None) => EventText {
                    title: format!("{actor} created repository {repo}"),
                    link: repo_url,
                    body: str_at(payload, "/description").map(String::from),
                },
                (ref_type, Some(name)) => EventText {
                    title: format!("{actor} created {ref_type} {name} in {repo}"),
                    link: format!("{repo_url}/tree/{name}"),
                    body: None,
                },
            }
        }
        "DeleteEvent" => EventText {
            title: format!(
                "{actor} deleted {} {} in {repo}",
                str_at(payload, "/ref_type").unwrap_or("branch"),
                str_at(payload, "/ref").unwrap_or_default()
            ),
            link: repo_url,
            body: None,
        },
        "ForkEvent" => {
            let fork = str_at(payload, "/forkee/full_name").unwrap_or(repo);
            EventText {
                title: format!("{actor} forked {repo} to {fork}"),
                link: str_at(payload, "/forkee/html_url")
                    .map(String::from)
                    .unwrap_or_else(|| format!("{WEB_URL}/{fork}")),
                body: None,
            }
        }
        "GollumEvent" => {
            let page = payload.pointer("/pages/0");
            let page_action = page.and_then(|p| str_at(p, "/action")).unwrap_or("updated");
            let page_title = page.and_then(|p| str_at(p, "/title")).unwrap_or("a page");
            EventText {
                title: format!("{actor} {page_action} the wiki page {page_title} in {repo}"),
                link: page
                    .and_then(|p| str_at(p, "/html_url"))
                    .map(String::from)
                    .unwrap_or_else(|| format!("{repo_url}/wiki")),
                body: None,
            }
        }
        "IssueCommentEvent" => {
            let number = u64_at(payload, "/issue/number").unwrap_or_default();
            let noun = if payload.pointer("/issue/pull_request").is_some() {
                "pull request"
            } else {
                "issue"
            };
            EventText {
                title: format!("{actor} commented on {noun} #{number} in {repo}"),
                link: str_at(payload, "/comment/html_url")
                    .or_else(|| str_at(payload, "/issue/html_url"))
                    .map(String::from)
                    .unwrap_or(repo_url),
                body: str_at(payload, "/comment/body").map(String::from),
            }
        }
        "IssuesEvent" => EventText {
            title: format!(
                "{actor} {action} issue #{} in {repo}",
                u64_at(payload, "/issue/number").unwrap_or_default()
            ),
            link: str_at(payload, "/issue/html_url").map(String::from).unwrap_or(repo_url),
            body: str_at(payload, "/issue/title").map(String::from),
        },
        "MemberEvent" => EventText {
            title: format!(
                "{actor} {action} {} as a collaborator to {repo}",
                str_at(payload, "/member/login").unwrap_or("someone")
            ),
            link: repo_url,
            body: None,
        },
        "PublicEvent" => EventText {
            title: format!("{actor} made {repo} public"),
            link: repo_url,
            body: None,
        },
        "PullRequestEvent" => {
            let merged = payload
                .pointer("/pull_request/merged")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let action = if action == "closed" && merged { "merged" } else { action };
            EventText {
                title: format!(
                    "{actor} {action} pull request #{} in {repo}",
                    u64_at(payload, "/number")
                        .or_else(|| u64_at(payload, "/pull_request/number"))
                        .unwrap_or_default()
                ),
                link: str_at(payload, "/pull_request/html_url").map(String::from).unwrap_or(repo_url),
                body: str_at(payload, "/pull_request/title").map(String::from),
            }
        }
        "PullRequestReviewEvent" => EventText {
            title: format!(
                "{actor} reviewed pull request #{} in {repo}",
                u64_at(payload, "/pull_request/number").unwrap_or_default()
            ),
            link: str_at(payload, "/review/html_url")
                .or_else(|| str_at(payload, "/pull_request/html_url"))
                .map(String::from)
                .unwrap_or(repo_url),
            body: str_at(payload, "/review/body").map(String::from),
        },
        "PullRequestReviewCommentEvent" => EventText {
            title: format!(
                "{actor} commented on pull request #{} in {repo}",
                u64_at(payload, "/pull_request/number").unwrap_or_default()
            ),
            link: str_at(payload, "/comment/html_url")
                .or_else(|| str_at(payload, "/pull_request/html_url"))
                .map(String::from)
                .unwrap_or(repo_url),
            body: str_at(payload, "/comment/body").map(String::from),
        },
        "PullRequestReviewThreadEvent" => EventText {
            title: format!(
                "{actor} {action} a review thread on pull request #{} in {repo}",
                u64_at(payload, "/pull_request/number").unwrap_or_default()
            ),
            link: str_at(payload, "/pull_request/html_url").map(String::from).unwrap_or(repo_url),
            body: None,
        },
        "PushEvent" => {
            let branch = str_at(payload, "/ref")
                .map(|r| r.trim_start_matches("refs/heads/"))
                .unwrap_or("a branch");
            let title = match u64_at(payload, "/size").or_else(|| u64_at(payload, "/distinct_size")) {
                Some(1) => format!("{actor} pushed 1 commit to {branch} in {repo}"),
                Some(n) => format!("{actor} pushed {n} commits to {branch} in {repo}"),
                None => format!("{actor} pushed to {branch} in {repo}"),
            };
            let link = match (str_at(payload, "/before"), str_at(payload, "/head")) {
                (Some(before), Some(head)) => format!("{repo_url}/compare/{before}...{head}"),
                _ => format!("{repo_url}/commits/{branch}"),
            };
            let messages: Vec<&str> = payload
                .pointer("/commits")
                .and_then(Value::as_array)
                .map(|commits| commits.iter().filter_map(|c| str_at(c, "/message")).collect())
                .unwrap_or_default();
            EventText {
                title,
                link,
                body: (!messages.is_empty()).then(|| messages.join("\n")),
            }
        }
        "ReleaseEvent" => {
            let name = str_at(payload, "/release/name")
                .or_else(|| str_at(payload, "/release/tag_name"))
                .unwrap_or("a release");
            EventText {
                title: format!("{actor} {action} release {name} in {repo}"),
                link: str_at(payload, "/release/html_url")
                    .map(String::from)
                    .unwrap_or_else(|| format!("{repo_url}/releases")),
                body: str_at(payload, "/release/body").map(String::from),
            }
        }
        "SponsorshipEvent" => EventText {
            title: format!("{actor} {action} a sponsorship"),
            link: format!("{WEB_URL}/{actor}"),
            body: None,
        },
        "WatchEvent" => EventText {
            title: format!("{actor} starred {repo}"),
            link: repo_url,
            body: None,
        },
        _ => return None,
    };

    Some(text)
}

fn format_event(event: &Event) -> Option<EventText> {
    format_event_parts(
        event.kind.as_deref()?,
        actor_name(&event.actor),
        &event.repo.name,
        &event.payload,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::domain::{GithubAccount, GithubOptions, SourceOptions, SourceType};
    use crate::fetcher::testing::StaticFetcher;
    use crate::normalizer::test_support::context;
    use crate::normalizer::Normalizer;
    use crate::services::Decrypt;

    struct Rot13;

    impl Decrypt for Rot13 {
        fn decrypt(&self, ciphertext: &str) -> Result<String> {
            Ok(ciphertext
                .chars()
                .map(|c| match c {
                    'a'..='m' | 'A'..='M' => (c as u8 + 13) as char,
                    'n'..='z' | 'N'..='Z' => (c as u8 - 13) as char,
                    _ => c,
                })
                .collect())
        }
    }

    fn profile(token: &str) -> Profile {
        Profile {
            id: "u".into(),
            account_github: Some(GithubAccount { token: token.into() }),
        }
    }

    fn github_source(options: GithubOptions) -> Source {
        Source::new(
            SourceType::Github,
            "u",
            "c",
            SourceOptions {
                github: Some(options),
                ..Default::default()
            },
        )
    }

    const NOTIFICATIONS: &str = r#"[
      {"id":"100","reason":"review_requested","updated_at":"2023-11-14T22:13:20Z",
       "subject":{"title":"Add feature","url":"https://api.github.com/repos/o/r/pulls/7","type":"PullRequest"},
       "repository":{"full_name":"o/r","html_url":"https://github.com/o/r","owner":{"login":"o","avatar_url":"https://avatars/o"}}},
      {"id":"101","reason":"ci_activity","updated_at":"2023-11-14T22:13:20Z",
       "subject":{"title":"CI failed","url":null,"type":"CheckSuite"},
       "repository":{"full_name":"o/r","html_url":"https://github.com/o/r","owner":{"login":"o"}}}
    ]"#;

    #[test]
    fn test_html_url() {
        let repo = "https://github.com/o/r";
        assert_eq!(
            html_url("https://api.github.com/repos/o/r/pulls/7", repo).as_deref(),
            Some("https://github.com/o/r/pull/7")
        );
        assert_eq!(
            html_url("https://api.github.com/repos/o/r/issues/3", repo).as_deref(),
            Some("https://github.com/o/r/issues/3")
        );
        assert_eq!(
            html_url("https://api.github.com/repos/o/r/commits/abc123", repo).as_deref(),
            Some("https://github.com/o/r/commit/abc123")
        );
        assert_eq!(
            html_url("https://api.github.com/repos/o/r/releases/99", repo).as_deref(),
            Some("https://github.com/o/r/releases")
        );
        assert_eq!(html_url("not a url", repo), None);
    }

    #[test]
    fn test_format_push_event() {
        let payload = json!({
            "ref": "refs/heads/main",
            "size": 2,
            "before": "aaa",
            "head": "bbb",
            "commits": [{"message": "Fix parser"}, {"message": "Bump version"}]
        });
        let text = format_event_parts("PushEvent", "ferris", "o/r", &payload).unwrap();
        assert_eq!(text.title, "ferris pushed 2 commits to main in o/r");
        assert_eq!(text.link, "https://github.com/o/r/compare/aaa...bbb");
        assert_eq!(text.body.as_deref(), Some("Fix parser\nBump version"));
    }

    #[test]
    fn test_format_pull_request_events() {
        let merged = json!({
            "action": "closed",
            "number": 5,
            "pull_request": {"merged": true, "html_url": "https://github.com/o/r/pull/5", "title": "Speed up"}
        });
        let text = format_event_parts("PullRequestEvent", "ferris", "o/r", &merged).unwrap();
        assert_eq!(text.title, "ferris merged pull request #5 in o/r");
        assert_eq!(text.link, "https://github.com/o/r/pull/5");

        let comment = json!({
            "issue": {"number": 9, "pull_request": {}},
            "comment": {"html_url": "https://github.com/o/r/pull/9#c1", "body": "<b>LGTM</b>"}
        });
        let text = format_event_parts("IssueCommentEvent", "ferris", "o/r", &comment).unwrap();
        assert_eq!(text.title, "ferris commented on pull request #9 in o/r");
    }

    #[test]
    fn test_format_simple_events() {
        let empty = json!({});
        assert_eq!(
            format_event_parts("WatchEvent", "ferris", "o/r", &empty).unwrap().title,
            "ferris starred o/r"
        );
        let branch = json!({"ref_type": "branch", "ref": "dev"});
        let text = format_event_parts("CreateEvent", "ferris", "o/r", &branch).unwrap();
        assert_eq!(text.title, "ferris created branch dev in o/r");
        assert_eq!(text.link, "https://github.com/o/r/tree/dev");
        assert!(format_event_parts("SomethingNewEvent", "ferris", "o/r", &empty).is_none());
    }

    #[tokio::test]
    async fn test_missing_token_is_validation_error() {
        let (ctx, fetcher) = context(StaticFetcher::new());
        let source = github_source(GithubOptions {
            kind: "notifications".into(),
            ..Default::default()
        });

        let err = Normalizer::new()
            .normalize(&ctx, &Profile::default(), &source, None)
            .await
            .unwrap_err();

        assert!(matches!(err, TributaryError::FeedValidation(_)));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_notifications() {
        let notifications_url = "https://api.github.com/notifications?participating=false&per_page=50";
        let fetcher = StaticFetcher::new()
            .route(notifications_url, "application/json", NOTIFICATIONS)
            .route(
                "https://api.github.com/user",
                "application/json",
                r#"{"login":"ferris","avatar_url":"https://avatars/ferris","html_url":"https://github.com/ferris"}"#,
            );
        let (ctx, fetcher) = context(fetcher);
        let ctx = ctx.secrets(Arc::new(Rot13));
        let source = github_source(GithubOptions {
            kind: "notifications".into(),
            ..Default::default()
        });

        let out = Normalizer::new()
            .normalize(&ctx, &profile("frperg"), &source, None)
            .await
            .unwrap();

        let request = fetcher.last_request(notifications_url).unwrap();
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer secret".to_string())));

        assert_eq!(out.source.title, "Notifications");
        assert_eq!(out.source.icon.as_deref(), Some("https://avatars/ferris"));
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].link.as_deref(), Some("https://github.com/o/r/pull/7"));
        assert_eq!(out.items[0].description.as_deref(), Some("PullRequest: review requested"));
        assert_eq!(out.items[1].link.as_deref(), Some("https://github.com/o/r"));
    }

    #[tokio::test]
    async fn test_repository_activities_drop_unknown_and_malformed_events() {
        let events = r#"[
          {"id":"1","type":"WatchEvent","actor":{"login":"ferris","display_login":"ferris"},"repo":{"name":"o/r"},"payload":{"action":"started"},"created_at":"2023-11-14T22:13:20Z"},
          {"id":"2","type":"BrandNewEvent","actor":{"login":"ferris"},"repo":{"name":"o/r"},"payload":{},"created_at":"2023-11-14T22:13:20Z"},
          {"id":"3","type":"WatchEvent","actor":{"login":"ferris"},"repo":{"name":"o/r"},"payload":{"action":"started"},"created_at":null},
          {"id":"4","type":"WatchEvent","repo":{"name":"o/r"},"created_at":"2023-11-14T22:13:20Z"}
        ]"#;
        let fetcher = StaticFetcher::new()
            .route("https://api.github.com/repos/o/r/events?per_page=50", "application/json", events)
            .route(
                "https://api.github.com/repos/o/r",
                "application/json",
                r#"{"full_name":"o/r","html_url":"https://github.com/o/r","owner":{"login":"o","avatar_url":"https://avatars/o"}}"#,
            );
        let (ctx, _) = context(fetcher);
        let source = github_source(GithubOptions {
            kind: "repositoryactivities".into(),
            repository: Some("o/r".into()),
            ..Default::default()
        });

        let out = Normalizer::new()
            .normalize(&ctx, &profile("token"), &source, None)
            .await
            .unwrap();

        assert_eq!(out.source.title, "o/r");
        assert_eq!(out.source.icon.as_deref(), Some("https://avatars/o"));
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].title.as_deref(), Some("ferris starred o/r"));
        assert_eq!(out.items[0].author.as_deref(), Some("ferris"));
    }
}
