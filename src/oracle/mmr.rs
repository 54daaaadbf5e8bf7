//! Maximal marginal relevance re-ranking.

/// Cosine similarity; zero-length or zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Pick up to `k` candidate indices trading relevance against diversity.
///
/// Starts from the candidate most similar to the query, then greedily adds
/// the one maximising `lambda * sim(query) - (1 - lambda) * max sim(selected)`.
/// `lambda = 1` is pure relevance, `lambda = 0` pure diversity.
pub fn maximal_marginal_relevance(query: &[f32], candidates: &[Vec<f32>], lambda: f64, k: usize) -> Vec<usize> {
    let target = k.min(candidates.len());
    if target == 0 {
        return Vec::new();
    }
    let lambda = lambda.clamp(0.0, 1.0);

    let to_query: Vec<f64> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let first = argmax(to_query.iter().copied().enumerate());
    let mut selected = vec![first];
    // Running max similarity of each candidate to anything selected so far.
    let mut redundancy: Vec<f64> = candidates
        .iter()
        .map(|c| cosine_similarity(c, &candidates[first]))
        .collect();

    while selected.len() < target {
        let scores = to_query
            .iter()
            .enumerate()
            .filter(|(i, _)| !selected.contains(i))
            .map(|(i, rel)| (i, lambda * rel - (1.0 - lambda) * redundancy[i]));
        let next = argmax(scores);
        selected.push(next);
        for (i, cand) in candidates.iter().enumerate() {
            redundancy[i] = redundancy[i].max(cosine_similarity(cand, &candidates[next]));
        }
    }
    selected
}

/// Index of the first maximum; the iterator must be non-empty.
fn argmax(scores: impl Iterator<Item = (usize, f64)>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    let mut seen = false;
    for (i, score) in scores {
        if !seen || score > best.1 {
            best = (i, score);
            seen = true;
        }
    }
    best.0
}
