//! Map a `TransitionSelection` to a concrete remote transition.

use issync_types::{ReasonCode, TransitionCandidate, TransitionMatchKind, TransitionOutcome, TransitionSelection};

/// Resolve `selection` against `candidates`. Candidates are taken in the
/// order the remote returned them; the `(to_status_name, name, id)` sort is
/// applied only to the ambiguity report (`byId`/`byName` with more than one
/// match), never to the dynamic search order itself.
pub fn resolve_transition(selection: &TransitionSelection, candidates: &[TransitionCandidate]) -> TransitionOutcome {
    match selection {
        TransitionSelection::ById(id) => {
            let matches: Vec<TransitionCandidate> = candidates.iter().filter(|c| &c.id == id).cloned().collect();
            finish(matches, candidates.to_vec(), TransitionMatchKind::ById)
        }
        TransitionSelection::ByName(name) => {
            let matches: Vec<TransitionCandidate> =
                candidates.iter().filter(|c| c.name.eq_ignore_ascii_case(name)).cloned().collect();
            finish(matches, candidates.to_vec(), TransitionMatchKind::ByName)
        }
        TransitionSelection::Dynamic { target_status_name } => {
            let mut tried = Vec::new();
            for candidate in candidates {
                tried.push(candidate.clone());
                if candidate.to_status_name.eq_ignore_ascii_case(target_status_name) {
                    return TransitionOutcome::Selected {
                        kind: TransitionMatchKind::Dynamic,
                        matched: candidate.clone(),
                        tried,
                    };
                }
            }
            TransitionOutcome::Unavailable { tried, reason_code: ReasonCode::TransitionUnavailable }
        }
    }
}

fn finish(
    mut matches: Vec<TransitionCandidate>,
    tried: Vec<TransitionCandidate>,
    kind: TransitionMatchKind,
) -> TransitionOutcome {
    sort_candidates(&mut matches);
    match matches.len() {
        0 => TransitionOutcome::Unavailable { tried, reason_code: ReasonCode::TransitionUnavailable },
        1 => TransitionOutcome::Selected { kind, matched: matches.remove(0), tried },
        _ => TransitionOutcome::Ambiguous { matches, reason_code: ReasonCode::TransitionAmbiguous },
    }
}

/// Deterministic order for an ambiguous match list: `(to_status_name, name,
/// id)`, all lowercased.
fn sort_candidates(candidates: &mut [TransitionCandidate]) {
    candidates.sort_by(|a, b| {
        let key = |c: &TransitionCandidate| (c.to_status_name.to_lowercase(), c.name.to_lowercase(), c.id.to_lowercase());
        key(a).cmp(&key(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, name: &str, to_status: &str) -> TransitionCandidate {
        TransitionCandidate { id: id.to_string(), name: name.to_string(), to_status_name: to_status.to_string() }
    }

    #[test]
    fn by_id_selects_exact_match() {
        let candidates = vec![candidate("1", "Start", "In Progress"), candidate("2", "Finish", "Done")];
        let outcome = resolve_transition(&TransitionSelection::ById("2".to_string()), &candidates);
        assert!(matches!(outcome, TransitionOutcome::Selected { matched, .. } if matched.id == "2"));
    }

    #[test]
    fn by_name_is_case_insensitive() {
        let candidates = vec![candidate("1", "Start", "In Progress")];
        let outcome = resolve_transition(&TransitionSelection::ByName("start".to_string()), &candidates);
        assert!(matches!(outcome, TransitionOutcome::Selected { .. }));
    }

    #[test]
    fn dynamic_matches_first_candidate_in_given_order_whose_target_status_matches() {
        let candidates = vec![candidate("1", "Z-Name", "Done"), candidate("2", "A-Name", "Done")];
        let outcome =
            resolve_transition(&TransitionSelection::Dynamic { target_status_name: "done".to_string() }, &candidates);
        // the candidate list is searched in the order given, not re-sorted
        assert!(matches!(outcome, TransitionOutcome::Selected { matched, .. } if matched.id == "1"));
    }

    #[test]
    fn dynamic_tried_list_covers_every_candidate_examined_up_to_the_match() {
        let candidates =
            vec![candidate("1", "Start", "In Progress"), candidate("2", "Stop", "Done"), candidate("3", "Later", "Done")];
        let outcome =
            resolve_transition(&TransitionSelection::Dynamic { target_status_name: "done".to_string() }, &candidates);
        match outcome {
            TransitionOutcome::Selected { matched, tried, .. } => {
                assert_eq!(matched.id, "2");
                assert_eq!(tried.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
            }
            other => panic!("expected selected, got {other:?}"),
        }
    }

    #[test]
    fn no_match_is_unavailable() {
        let candidates = vec![candidate("1", "Start", "In Progress")];
        let outcome = resolve_transition(&TransitionSelection::ByName("nope".to_string()), &candidates);
        assert!(matches!(
            outcome,
            TransitionOutcome::Unavailable { reason_code: ReasonCode::TransitionUnavailable, .. }
        ));
    }

    #[test]
    fn two_matches_by_name_is_ambiguous_and_sorted() {
        let candidates = vec![candidate("2", "Ship", "Released"), candidate("1", "Ship", "Released")];
        let outcome = resolve_transition(&TransitionSelection::ByName("ship".to_string()), &candidates);
        match outcome {
            TransitionOutcome::Ambiguous { matches, reason_code } => {
                assert_eq!(reason_code, ReasonCode::TransitionAmbiguous);
                assert_eq!(matches[0].id, "1");
                assert_eq!(matches[1].id, "2");
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }
}
