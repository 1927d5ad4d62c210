//! Request and project cross-references
//!
//! Every transformer ends by making the two reference lists agree: a request
//! lists a project exactly when that project lists the request.

use crate::domain::export::{ExportProject, ExportRequest};
use std::collections::{HashMap, HashSet};

/// Make request `projects` and project `requests` lists bidirectionally consistent
///
/// References from either side are kept and mirrored onto the other side.
/// References to keys that do not exist are dropped, and duplicates are
/// removed keeping first occurrences.
pub fn link_requests_and_projects(requests: &mut [ExportRequest], projects: &mut [ExportProject]) {
    let project_index: HashMap<String, usize> = projects
        .iter()
        .enumerate()
        .map(|(i, p)| (p.key.clone(), i))
        .collect();
    let request_index: HashMap<String, usize> = requests
        .iter()
        .enumerate()
        .map(|(i, r)| (r.key.clone(), i))
        .collect();

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for (ri, request) in requests.iter().enumerate() {
        for project_key in &request.projects {
            if let Some(&pi) = project_index.get(project_key) {
                if seen.insert((ri, pi)) {
                    pairs.push((ri, pi));
                }
            }
        }
    }
    for (pi, project) in projects.iter().enumerate() {
        for request_key in &project.requests {
            if let Some(&ri) = request_index.get(request_key) {
                if seen.insert((ri, pi)) {
                    pairs.push((ri, pi));
                }
            }
        }
    }

    // Rebuild both sides preserving the original order of each list
    for request in requests.iter_mut() {
        let valid: Vec<String> = dedup(
            request
                .projects
                .iter()
                .filter(|k| project_index.contains_key(*k))
                .cloned(),
        );
        request.projects = valid;
    }
    for project in projects.iter_mut() {
        let valid: Vec<String> = dedup(
            project
                .requests
                .iter()
                .filter(|k| request_index.contains_key(*k))
                .cloned(),
        );
        project.requests = valid;
    }

    for (ri, pi) in pairs {
        let project_key = projects[pi].key.clone();
        let request_key = requests[ri].key.clone();
        requests[ri].add_project(&project_key);
        projects[pi].add_request(&request_key);
    }
}

fn dedup(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.filter(|k| seen.insert(k.clone())).collect()
}
