//! Text helpers shared by the grounding and graph modules.

/// Split text after sentence-terminal punctuation (`.`, `!`, `?`) that is
/// followed by whitespace. The punctuation stays with its sentence; fragments
/// are trimmed and empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let boundary = idx + ch.len_utf8();
        match chars.peek() {
            Some(&(_, next)) if next.is_whitespace() => {
                push_trimmed(&mut sentences, &text[start..boundary]);
                while let Some(&(_, ws)) = chars.peek() {
                    if !ws.is_whitespace() {
                        break;
                    }
                    chars.next();
                }
                start = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
            }
            _ => {}
        }
    }
    if start < text.len() {
        push_trimmed(&mut sentences, &text[start..]);
    }
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn prefix_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cosine similarity of two embeddings.
///
/// Empty vectors, mismatched lengths and zero-magnitude vectors all score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|y| (*y as f64).powi(2)).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
