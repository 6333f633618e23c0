use criterion::{criterion_group, criterion_main, Criterion};
use lintpilot::classifier::RuleClassifier;
use lintpilot::config::RulesConfig;
use lintpilot::core::{Issue, Language};
use lintpilot::io::MemoryFileSystem;
use lintpilot::orchestrator::{FixOrchestrator, FixPlan, PlanOptions};
use lintpilot::safety::SafetyChecker;
use std::hint::black_box;

fn create_test_file(lines: usize) -> (String, Vec<Issue>) {
    let issue = |line: usize, code: &str, message: &str| {
        Issue::new("/bench/app.py", line, code, message, Language::Python).unwrap()
    };
    let mut content = String::from("import os\nimport sys\nif sys.argv == None:\n    print(sys.argv)\n");
    let mut issues = vec![
        issue(1, "F401", "`os` imported but unused"),
        issue(3, "E711", "Comparison to `None` should be `cond is None`"),
    ];
    for i in 0..lines {
        if i % 3 == 0 {
            content.push_str(&format!("value_{i} = {i}   \n"));
            issues.push(issue(i + 5, "W291", "Trailing whitespace"));
        } else {
            content.push_str(&format!("value_{i} = {i}\n"));
        }
    }
    (content, issues)
}

fn bench_classification(c: &mut Criterion) {
    let classifier = RuleClassifier::new();
    let codes = ["F401", "W291", "E501", "D100", "no-extra-semi", "X999"];
    c.bench_function("classify_codes", |b| {
        b.iter(|| {
            for code in codes {
                black_box(classifier.classify(black_box(code), Language::Python));
            }
        })
    });
}

fn bench_fix_file(c: &mut Criterion) {
    let (content, issues) = create_test_file(500);
    let classifier = RuleClassifier::new();
    let triage = classifier.group_by_category(&issues);
    let plan = FixPlan::build(&triage, &classifier, &RulesConfig::default(), &PlanOptions::default());
    let checker = SafetyChecker::default();

    c.bench_function("fix_and_check_file", |b| {
        b.iter(|| {
            let fs = MemoryFileSystem::new().with_file("/bench/app.py", content.clone());
            let summary = FixOrchestrator::new(&fs, &checker).execute(black_box(&plan));
            black_box(summary.issues_fixed())
        })
    });
}

criterion_group!(benches, bench_classification, bench_fix_file);
criterion_main!(benches);
