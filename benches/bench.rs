// Criterion benchmarks for CareMatch

use carematch::core::{distance::haversine_distance, Matcher};
use carematch::models::{GeoPoint, HelperCandidate, MatchFilterConfig, ServiceRequest};
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SERVICES: &[&str] = &["shopping", "medical", "companionship", "housekeeping"];

fn create_candidate(id: usize, lat: f64, lng: f64) -> HelperCandidate {
    HelperCandidate {
        id: Some(id.to_string()),
        name: Some(format!("Helper {}", id)),
        location: Some(GeoPoint::new(lat, lng)),
        average_rating: (id % 4 != 0).then(|| 3.0 + (id % 20) as f64 / 10.0),
        total_reviews: Some((id % 120) as u32),
        services_offered: Some(
            SERVICES
                .iter()
                .take(1 + id % SERVICES.len())
                .map(|s| s.to_string())
                .collect(),
        ),
        skills: Some(vec!["driving".to_string()]),
        last_active_at: Some(Utc::now() - Duration::hours((id % 800) as i64)),
        ..Default::default()
    }
}

fn create_request() -> ServiceRequest {
    ServiceRequest {
        id: "bench-request".to_string(),
        service_type: "medical".to_string(),
        location: Some(GeoPoint::new(40.7128, -74.0060)),
        address: None,
        scheduled_time: Utc::now(),
        required_skills: vec!["driving".to_string(), "first aid".to_string()],
        preferred_language: "en".to_string(),
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(40.7128),
                black_box(-74.0060),
                black_box(40.72),
                black_box(-74.01),
            )
        });
    });
}

fn bench_matching(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let request = create_request();
    let config = MatchFilterConfig::builder().min_rating(3.5).build();

    let mut group = c.benchmark_group("matching");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<HelperCandidate> = (0..*candidate_count)
            .map(|i| {
                let lat_offset = (i as f64 * 0.001) % 0.3;
                let lng_offset = (i as f64 * 0.0007) % 0.3;
                create_candidate(i, 40.7128 + lat_offset, -74.0060 + lng_offset)
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("find_matches", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    matcher.find_matches(
                        black_box(&request),
                        black_box(candidates.clone()),
                        black_box(&config),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_haversine_distance, bench_matching);

criterion_main!(benches);
