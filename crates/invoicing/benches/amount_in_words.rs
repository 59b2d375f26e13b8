use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use rust_decimal::Decimal;

use exportdesk_core::{Amount, InvoiceId};
use exportdesk_invoicing::{InvoiceDraft, ItemDraft, amount_in_words};

fn bench_amount_in_words(c: &mut Criterion) {
    let mut group = c.benchmark_group("amount_in_words");

    let samples = [
        ("zero", Amount::zero()),
        ("three_digits", Amount::new(Decimal::new(210, 0)).unwrap()),
        ("with_cents", Amount::new(Decimal::new(150050, 2)).unwrap()),
        ("max", Amount::new(Decimal::new(99_999_999_999_999, 2)).unwrap()),
    ];

    for (name, amount) in samples {
        group.bench_with_input(BenchmarkId::from_parameter(name), &amount, |b, amount| {
            b.iter(|| amount_in_words(black_box(*amount)));
        });
    }

    group.finish();
}

fn bench_compose_invoice(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_invoice");

    for lines in [1usize, 20, 200] {
        let draft = InvoiceDraft {
            invoice_no: "EXP/BENCH/001".to_string(),
            invoice_date: "2024-06-15".to_string(),
            exporter_name: Some("Acme Exports".to_string()),
            consignee_name: Some("Globex GmbH".to_string()),
            items: (0..lines)
                .map(|i| ItemDraft {
                    description: Some(format!("Item {i}")),
                    quantity: Some(Decimal::new(1000 + i as i64, 1)),
                    rate: Some(Decimal::new(125, 2)),
                    ..ItemDraft::default()
                })
                .collect(),
            ..InvoiceDraft::default()
        };

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &draft, |b, draft| {
            b.iter(|| {
                let invoice = draft
                    .clone()
                    .compose(InvoiceId::new(), Utc::now())
                    .unwrap();
                black_box(invoice)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_amount_in_words, bench_compose_invoice);
criterion_main!(benches);
