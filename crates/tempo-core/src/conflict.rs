//! Detection of overlap between a local record and existing worklogs.

use crate::interval::Span;
use crate::service::RemoteWorklog;

/// Finds an existing worklog overlapping the record span, if any.
///
/// The first hit wins; one overlap is enough to skip the record, so no
/// best-match search is attempted. The existing set is the one fetched
/// for the whole window at the start of the run.
pub fn find_conflict<'a>(span: &Span, existing: &'a [RemoteWorklog]) -> Option<&'a RemoteWorklog> {
    existing
        .iter()
        .find(|worklog| worklog.span().overlaps(span))
}
