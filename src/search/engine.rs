use crate::config::SearchConfig;
use crate::indexing::extract_text;
use crate::morphology::lemma_sequence;
use crate::search::snippet::build_snippet;
use crate::search::types::{SearchHit, SearchQuery, SearchResponse};
use crate::storage::{PageRecord, SharedStorage, SiteRecord, Storage, StorageResult};
use crate::url::SiteUrl;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ranked AND-search over the lemma index
pub struct SearchEngine {
    storage: SharedStorage,
    config: SearchConfig,
}

/// A matching page before pagination
#[derive(Debug, Clone, Copy)]
struct Scored {
    page_id: i64,
    absolute: f64,
    relative: f64,
}

impl SearchEngine {
    pub fn new(storage: SharedStorage, config: SearchConfig) -> Self {
        Self { storage, config }
    }

    /// Runs a query
    ///
    /// A page matches when it holds a posting for every query lemma that
    /// survives the frequency filter. Blank queries, queries without
    /// lemmas and unknown sites give an empty response.
    ///
    /// Results are ordered by relative relevance, best first; pages with the
    /// same relevance keep ascending page ID order.
    pub fn search(&self, query: &SearchQuery) -> StorageResult<SearchResponse> {
        if query.text.trim().is_empty() {
            return Ok(SearchResponse::default());
        }

        let lemmas = unique_lemmas(&query.text);
        if lemmas.is_empty() {
            debug!("Query {:?} has no lemmas", query.text);
            return Ok(SearchResponse::default());
        }

        let (total, hits, sites, lemmas) = {
            let storage = self.storage.lock();

            let site_id = match &query.site {
                Some(site) => match resolve_site(&*storage, site)? {
                    Some(id) => Some(id),
                    None => {
                        debug!("Search in unknown site {}", site);
                        return Ok(SearchResponse::default());
                    }
                },
                None => None,
            };

            let lemmas = self.select_lemmas(&*storage, lemmas, site_id)?;
            let pages = match_pages(&*storage, &lemmas, site_id)?;
            let scored = score(&*storage, &pages, &lemmas)?;

            let limit = query.limit.unwrap_or(self.config.default_limit);
            let mut sites: HashMap<i64, SiteRecord> = HashMap::new();
            let mut hits = Vec::new();
            for entry in scored.iter().skip(query.offset).take(limit) {
                let page = storage.get_page(entry.page_id)?;
                if !sites.contains_key(&page.site_id) {
                    sites.insert(page.site_id, storage.get_site(page.site_id)?);
                }
                hits.push((*entry, page));
            }

            (scored.len(), hits, sites, lemmas)
        };

        // HTML parsing for titles and snippets runs without the lock
        let results = hits
            .into_iter()
            .filter_map(|(entry, page)| {
                let site = sites.get(&page.site_id)?;
                Some(self.build_hit(entry, page, site, &lemmas))
            })
            .collect();

        Ok(SearchResponse { total, results })
    }

    /// Applies the frequency filter and orders lemmas rarest first
    fn select_lemmas(
        &self,
        storage: &dyn Storage,
        lemmas: Vec<String>,
        site_id: Option<i64>,
    ) -> StorageResult<Vec<String>> {
        let mut weighted = Vec::with_capacity(lemmas.len());
        for lemma in lemmas {
            let frequency = storage.lemma_document_frequency(&lemma, site_id)?;
            weighted.push((lemma, frequency));
        }
        weighted.sort_by_key(|(_, frequency)| *frequency);

        if let Some(percent) = self.config.frequency_threshold_percent {
            let pages = storage.count_pages(site_id)?;
            let limit = pages as f64 * percent / 100.0;
            let rarest = weighted.first().cloned();

            weighted.retain(|(lemma, frequency)| {
                let keep = (*frequency as f64) <= limit;
                if !keep {
                    debug!("Ignoring frequent lemma {} ({} pages)", lemma, frequency);
                }
                keep
            });
            if weighted.is_empty() {
                weighted.extend(rarest);
            }
        }

        Ok(weighted.into_iter().map(|(lemma, _)| lemma).collect())
    }

    fn build_hit(&self, entry: Scored, page: PageRecord, site: &SiteRecord, lemmas: &[String]) -> SearchHit {
        let text = extract_text(&page.content);

        SearchHit {
            page_id: page.id,
            site_url: site.url.clone(),
            site_name: site.name.clone(),
            path: page.path,
            title: text.title,
            snippet: build_snippet(&text.body, lemmas, self.config.snippet_size),
            absolute_relevance: entry.absolute,
            relative_relevance: entry.relative,
        }
    }
}

/// Lemmas of the query with repeats removed, in input order
fn unique_lemmas(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    lemma_sequence(text)
        .into_iter()
        .filter(|lemma| seen.insert(lemma.clone()))
        .collect()
}

fn resolve_site(storage: &dyn Storage, site: &str) -> StorageResult<Option<i64>> {
    let home = match SiteUrl::parse(site) {
        Ok(home) => home,
        Err(_) => return Ok(None),
    };
    Ok(storage.find_site_by_url(home.as_str())?.map(|site| site.id))
}

/// Intersects the posting lists of `lemmas`, which must be ordered rarest first
fn match_pages(storage: &dyn Storage, lemmas: &[String], site_id: Option<i64>) -> StorageResult<Vec<i64>> {
    let (first, rest) = match lemmas.split_first() {
        Some(split) => split,
        None => return Ok(Vec::new()),
    };

    let mut pages = storage.find_pages_matching_lemma(first, site_id)?;
    for lemma in rest {
        if pages.is_empty() {
            break;
        }
        let matching: HashSet<i64> = storage
            .find_pages_matching_lemma(lemma, site_id)?
            .into_iter()
            .collect();
        pages.retain(|page_id| matching.contains(page_id));
    }

    Ok(pages)
}

/// Scores and sorts matching pages
fn score(storage: &dyn Storage, pages: &[i64], lemmas: &[String]) -> StorageResult<Vec<Scored>> {
    let mut scored = Vec::with_capacity(pages.len());
    for &page_id in pages {
        let absolute = storage.sum_rank_for_page_and_lemmas(page_id, lemmas)?;
        scored.push(Scored {
            page_id,
            absolute,
            relative: 0.0,
        });
    }

    let best = scored.iter().map(|s| s.absolute).fold(0.0_f64, f64::max);
    for entry in &mut scored {
        entry.relative = if best > 0.0 { entry.absolute / best } else { 1.0 };
    }

    scored.sort_by(|a, b| {
        b.relative
            .partial_cmp(&a.relative)
            .unwrap_or(Ordering::Equal)
            .then(a.page_id.cmp(&b.page_id))
    });
    Ok(scored)
}
