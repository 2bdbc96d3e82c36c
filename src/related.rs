// src/related.rs
//! Related-article scoring: tag Jaccard + weighted entity Jaccard + a flat
//! bonus for a shared category. O(n²) over the corpus, which stays small.

use std::collections::HashSet;

use crate::config::RelatedCfg;
use crate::corpus::Article;

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

/// Per-article feature sets, computed once per build.
#[derive(Debug)]
struct Features {
    tags: HashSet<String>,
    entities: HashSet<String>,
}

impl Features {
    fn of(a: &Article) -> Self {
        Self {
            tags: a.tags.iter().cloned().collect(),
            entities: a.entities.iter().map(|e| e.name.to_lowercase()).collect(),
        }
    }
}

fn pair_score(fa: &Features, fb: &Features, same_category: bool, cfg: &RelatedCfg) -> f64 {
    let mut s = jaccard(&fa.tags, &fb.tags) + cfg.entity_weight * jaccard(&fa.entities, &fb.entities);
    if same_category {
        s += cfg.category_bonus;
    }
    s
}

/// Scores every pair within one corpus.
#[derive(Debug)]
pub struct RelatedIndex<'a> {
    articles: &'a [Article],
    features: Vec<Features>,
    cfg: RelatedCfg,
}

impl<'a> RelatedIndex<'a> {
    pub fn new(articles: &'a [Article], cfg: &RelatedCfg) -> Self {
        Self {
            articles,
            features: articles.iter().map(Features::of).collect(),
            cfg: cfg.clone(),
        }
    }

    /// Similarity of corpus entries `i` and `j`.
    pub fn score(&self, i: usize, j: usize) -> f64 {
        let same_category = self.articles[i].category == self.articles[j].category;
        pair_score(&self.features[i], &self.features[j], same_category, &self.cfg)
    }

    /// Top matches for corpus entry `i`, best first; ties keep corpus order.
    pub fn related_to(&self, i: usize) -> Vec<(&'a Article, f64)> {
        let mut scored: Vec<(usize, f64)> = (0..self.articles.len())
            .filter(|&j| j != i)
            .map(|j| (j, self.score(i, j)))
            .filter(|&(_, s)| s > self.cfg.threshold)
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(self.cfg.max_results)
            .map(|(j, s)| (&self.articles[j], s))
            .collect()
    }
}

/// One-off convenience for a single target; builds are better served by [`RelatedIndex`].
pub fn related_articles<'a>(
    target: &Article,
    corpus: &'a [Article],
    cfg: &RelatedCfg,
) -> Vec<&'a Article> {
    let key = target.rel_path();
    let ft = Features::of(target);
    let mut scored: Vec<(&'a Article, f64)> = corpus
        .iter()
        .filter(|a| a.rel_path() != key)
        .map(|a| {
            let s = pair_score(&ft, &Features::of(a), target.category == a.category, cfg);
            (a, s)
        })
        .filter(|&(_, s)| s > cfg.threshold)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
        .into_iter()
        .take(cfg.max_results)
        .map(|(a, _)| a)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::parse_article_str;
    use std::path::Path;

    fn art(slug: &str, category: &str, tags: &[&str], entities: &[&str]) -> Article {
        let text = format!(
            "---\ntitle: {slug}\nslug: {slug}\ndate: 2025-01-07T10:00:00Z\ncategory: {category}\ntags: [{}]\nentities: [{}]\n---\nbody\n",
            tags.join(", "),
            entities.join(", ")
        );
        parse_article_str(&text, Path::new("t.md")).unwrap().unwrap()
    }

    #[test]
    fn full_overlap_beats_no_overlap() {
        let corpus = vec![
            art("target", "macro", &["fed", "rates"], &["Federal Reserve", "Jerome Powell"]),
            art("unrelated", "crypto", &["bitcoin"], &["Coinbase"]),
            art("twin", "macro", &["rates", "fed"], &["jerome powell", "federal reserve"]),
        ];
        let cfg = RelatedCfg::default();
        let idx = RelatedIndex::new(&corpus, &cfg);
        let twin = idx.score(0, 2);
        assert!((twin - (1.0 + 1.5 + 0.3)).abs() < 1e-9);
        assert!(twin > cfg.threshold);
        assert_eq!(idx.score(0, 1), 0.0);

        let picks = idx.related_to(0);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].0.slug, "twin");
    }

    #[test]
    fn same_category_alone_does_not_qualify_and_self_is_excluded() {
        let corpus = vec![
            art("a", "macro", &["x"], &[]),
            art("b", "macro", &["y"], &[]),
        ];
        let idx = RelatedIndex::new(&corpus, &RelatedCfg::default());
        assert!(idx.related_to(0).is_empty());
    }

    #[test]
    fn ties_keep_corpus_order_and_respect_limit() {
        let mut corpus = vec![art("t", "macro", &["fed"], &[])];
        for i in 0..6 {
            corpus.push(art(&format!("c{i}"), "macro", &["fed"], &[]));
        }
        let cfg = RelatedCfg::default();
        let picks = related_articles(&corpus[0], &corpus, &cfg);
        let slugs: Vec<&str> = picks.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c0", "c1", "c2", "c3"]);
    }
}
