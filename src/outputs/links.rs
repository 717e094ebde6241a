//! The links file: discovered front-page URLs grouped by outlet.
//!
//! ```text
//! # 동아일보
//! https://n.news.naver.com/article/newspaper/020/0003674837?date=20251117
//! https://n.news.naver.com/article/newspaper/020/0003674838?date=20251117
//!
//! # 한국일보
//! https://n.news.naver.com/article/newspaper/469/0000812345?date=20251117
//! ```
//!
//! A run can write the file after discovery, and a later run can start from
//! it instead of discovering links again.

use crate::models::CandidateLink;
use itertools::Itertools;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// Outlet name used for URLs that appear before any `# outlet` header.
pub const UNKNOWN_SOURCE: &str = "unknown outlet";

/// Render links in the links file format, outlets in order of first appearance.
pub fn format_links(links: &[CandidateLink]) -> String {
    links
        .iter()
        .into_group_map_by(|link| link.source.as_str())
        .into_iter()
        .sorted_by_key(|(source, _)| {
            links
                .iter()
                .position(|l| l.source == *source)
                .unwrap_or(usize::MAX)
        })
        .map(|(source, group)| {
            let urls = group.iter().map(|link| link.url.as_str()).join("\n");
            format!("# {source}\n{urls}\n")
        })
        .join("\n")
}

/// Parse the links file format.
pub fn parse_links(text: &str) -> Vec<CandidateLink> {
    let mut current: Option<String> = None;
    let mut links = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(name) = line.strip_prefix('#') {
            let name = name.trim();
            current = (!name.is_empty()).then(|| name.to_string());
            continue;
        }
        links.push(CandidateLink {
            source: current.clone().unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            url: line.to_string(),
        });
    }
    links
}

#[instrument(level = "info", skip_all, fields(%path))]
pub async fn write_links_file(links: &[CandidateLink], path: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, format_links(links)).await?;
    info!(count = links.len(), "Wrote links file");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(%path))]
pub async fn read_links_file(path: &str) -> Result<Vec<CandidateLink>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let links = parse_links(&text);
    info!(count = links.len(), "Read links file");
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(source: &str, url: &str) -> CandidateLink {
        CandidateLink {
            source: source.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_format_groups_by_outlet() {
        let links = vec![
            link("한겨레", "https://x/1"),
            link("동아일보", "https://x/2"),
            link("한겨레", "https://x/3"),
        ];
        assert_eq!(
            format_links(&links),
            "# 한겨레\nhttps://x/1\nhttps://x/3\n\n# 동아일보\nhttps://x/2\n"
        );
    }

    #[test]
    fn test_parse_assigns_outlets() {
        let text = "https://x/0\n\n# 동아일보\nhttps://x/1\n  https://x/2  \n\n#\nhttps://x/3\n# 한겨레\nhttps://x/4\n";
        let links = parse_links(text);
        assert_eq!(
            links,
            vec![
                link(UNKNOWN_SOURCE, "https://x/0"),
                link("동아일보", "https://x/1"),
                link("동아일보", "https://x/2"),
                link(UNKNOWN_SOURCE, "https://x/3"),
                link("한겨레", "https://x/4"),
            ]
        );
    }

    #[tokio::test]
    async fn test_links_file_written_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("urls.txt");
        let path = path.to_str().unwrap();
        let links = vec![link("조선일보", "https://x/1"), link("중앙일보", "https://x/2")];

        write_links_file(&links, path).await.unwrap();
        assert_eq!(read_links_file(path).await.unwrap(), links);
    }
}
