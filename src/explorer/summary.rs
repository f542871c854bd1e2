use crate::gateway::{FileStatusEntry, UNTRACKED};

/// Status bar text: `git: <branch> clean`, or the non-zero change buckets
/// in `M A D ?` order.
pub fn summarize(branch: Option<&str>, statuses: &[FileStatusEntry]) -> String {
    let mut counts = [0usize; 4];
    for entry in statuses {
        let status = entry.status.trim();
        if status.is_empty() {
            continue;
        }
        if status.starts_with(UNTRACKED) {
            counts[3] += 1;
            continue;
        }
        for (bucket, letter) in ['M', 'A', 'D'].into_iter().enumerate() {
            if status.contains(letter) {
                counts[bucket] += 1;
            }
        }
    }

    let branch = branch.filter(|branch| !branch.is_empty()).unwrap_or("-");
    let mut parts = vec![format!("git: {branch}")];
    if counts.iter().all(|count| *count == 0) {
        parts.push("clean".to_string());
    } else {
        for (label, count) in ["M", "A", "D", "?"].into_iter().zip(counts) {
            if count > 0 {
                parts.push(format!("{label}{count}"));
            }
        }
    }
    parts.join(" ")
}
