//! Benchmarks for manuscript export performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks export synthetic projects of growing size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use manuscript::model::{
    Alignment, Delta, InlineStyle, Object, Op, ParagraphFormat, PropertyKind, PropertyValue,
    SchemeProperty, Text,
};
use manuscript::render::escape_rtf;
use manuscript::{export, DocxPackager, ExportFormat, Profile, Project, ZipPackager};

/// Creates a project with `text_count` texts, each mentioning two of ten objects.
fn create_test_project(text_count: usize) -> Project {
    let mut project = Project::new("Benchmark");
    project.add_format(ParagraphFormat::new("H", "Heading").with_align(Alignment::Center));
    project.add_object(
        Object::new("PEOPLE", "People")
            .with_property(SchemeProperty::new("role", "Role", PropertyKind::Text)),
    );
    for i in 0..10 {
        project.add_object(
            Object::new(format!("O{}", i), format!("Person {}", i))
                .with_parent("PEOPLE")
                .with_value("role", PropertyValue::Text(format!("Role {}", i))),
        );
    }

    for i in 0..text_count {
        let ops = vec![
            Op::text(format!("Chapter {}", i + 1)),
            Op::text("\n").with_format("H"),
            Op::text("It was a dark and stormy night; "),
            Op::text(format!("Person {}", i % 10)).with_object(format!("O{}", i % 10)),
            Op::text(" met "),
            Op::text(format!("Person {}", (i + 3) % 10)).with_object(format!("O{}", (i + 3) % 10)),
            Op::text(" in the café.\n"),
            Op::text("Nobody").with_style(InlineStyle::Italic),
            Op::text(" {noticed} the \\ backslash.\n"),
        ];
        project.add_text(Text::new(format!("T{}", i), format!("Text {}", i), Delta::from_ops(ops)));
    }
    project
}

/// Benchmark a full export per format.
fn bench_export_formats(c: &mut Criterion) {
    let project = create_test_project(50);
    let mut group = c.benchmark_group("export_formats");

    for format in ExportFormat::ALL {
        let profile = Profile::for_format(format);
        group.bench_function(format.extension(), |b| {
            b.iter(|| export(black_box(&project), &profile).unwrap());
        });
    }

    group.finish();
}

/// Benchmark RTF export at various sizes.
fn bench_rtf_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtf_export");
    let profile = Profile::for_format(ExportFormat::Rtf);

    for text_count in [10, 100, 500].iter() {
        let project = create_test_project(*text_count);
        group.bench_function(format!("{}_texts", text_count), |b| {
            b.iter(|| export(black_box(&project), &profile).unwrap());
        });
    }

    group.finish();
}

/// Benchmark RTF escaping of mixed text.
fn bench_rtf_escaping(c: &mut Criterion) {
    let text = "Grüße aus Köln {mit} \\ Klammern und 中文 ".repeat(100);
    c.bench_function("escape_rtf", |b| {
        b.iter(|| escape_rtf(black_box(&text)));
    });
}

/// Benchmark DOCX packaging.
fn bench_docx_packaging(c: &mut Criterion) {
    let project = create_test_project(100);
    let output = export(&project, &Profile::for_format(ExportFormat::Docx)).unwrap();
    let packager = ZipPackager::new();

    c.bench_function("docx_packaging", |b| {
        b.iter(|| output.to_bytes(black_box(&packager as &dyn DocxPackager)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_export_formats,
    bench_rtf_scaling,
    bench_rtf_escaping,
    bench_docx_packaging,
);
criterion_main!(benches);
