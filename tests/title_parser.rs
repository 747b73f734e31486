use marca_matcher::model::CatalogRow;
use marca_matcher::{normalize, parse, Catalog, ParseMethod, ParsedTitle};
use std::sync::Arc;

fn reference_catalog() -> Catalog {
    let pairs = [
        ("OPEL", "Corsa"),
        ("OPEL", "Astra"),
        ("OPEL", "Grandland X"),
        ("Mercedes-Benz", "Clase A"),
        ("Mercedes-Benz", "Clase C"),
        ("Mercedes-Benz", "GLA"),
        ("BMW", "Serie 3"),
        ("BMW", "X5"),
        ("Land", "Cruiser"),
        ("Land Rover", "Defender"),
        ("Land Rover", "Range Rover Evoque"),
        ("Land Rover", "Range Rover"),
        ("SEAT", "León"),
        ("Citroën", "C4"),
        ("Citroën", "C4 Picasso"),
    ];
    Catalog::from_rows(pairs.iter().map(|(b, m)| CatalogRow::new(*b, *m)))
}

fn expect(p: &ParsedTitle, brand: Option<&str>, model: Option<&str>, version: Option<&str>) {
    assert_eq!(p.brand.as_deref(), brand, "brand of {p:?}");
    assert_eq!(p.model.as_deref(), model, "model of {p:?}");
    assert_eq!(p.version.as_deref(), version, "version of {p:?}");
}

#[test]
fn opel_corsa_exact() {
    let catalog = Catalog::from_rows(vec![CatalogRow::new("OPEL", "Corsa")]);
    let p = parse("OPEL Corsa 1.5D DT 74kW 100CV Edition 5p.", &catalog);
    expect(&p, Some("OPEL"), Some("Corsa"), Some("1.5D DT 74kW 100CV Edition 5p."));
    assert_eq!(p.confidence, 1.0);
    assert_eq!(p.method, ParseMethod::DbExact);
}

#[test]
fn mercedes_clase_a_exact() {
    let catalog = Catalog::from_rows(vec![CatalogRow::new("Mercedes-Benz", "Clase A")]);
    let p = parse("Mercedes-Benz Clase A A 200 CDI", &catalog);
    expect(&p, Some("Mercedes-Benz"), Some("Clase A"), Some("A 200 CDI"));
    assert_eq!(p.confidence, 1.0);
}

#[test]
fn tesla_heuristic_on_empty_catalog() {
    let p = parse("Tesla Model 3 Long Range", &Catalog::default());
    expect(&p, Some("Tesla"), Some("Model 3"), Some("Long Range"));
    assert_eq!(p.confidence, 0.5);
    assert_eq!(p.method, ParseMethod::Heuristic);
}

#[test]
fn unknown_opel_model_is_brand_only() {
    let p = parse("OPEL NuevoModelo 2025 Hybrid", &reference_catalog());
    expect(&p, Some("OPEL"), Some("NuevoModelo"), Some("2025 Hybrid"));
    assert_eq!(p.confidence, 0.7);
    assert_eq!(p.method, ParseMethod::DbBrandOnly);
}

#[test]
fn empty_title() {
    let p = parse("", &reference_catalog());
    expect(&p, None, None, None);
    assert_eq!(p.confidence, 0.0);
    assert_eq!(p.method, ParseMethod::Heuristic);
}

#[test]
fn longest_brand_wins() {
    let p = parse("Land Rover Defender 110", &reference_catalog());
    expect(&p, Some("Land Rover"), Some("Defender"), Some("110"));
    assert_eq!(p.method, ParseMethod::DbExact);

    let p = parse("Land Cruiser 150", &reference_catalog());
    expect(&p, Some("Land"), Some("Cruiser"), Some("150"));
}

#[test]
fn longest_model_wins() {
    let p = parse("Land Rover Range Rover Evoque 2.0 eD4", &reference_catalog());
    expect(&p, Some("Land Rover"), Some("Range Rover Evoque"), Some("2.0 eD4"));

    let p = parse("Citroen C4 Picasso 1.6 HDi", &reference_catalog());
    expect(&p, Some("Citroën"), Some("C4 Picasso"), Some("1.6 HDi"));

    let p = parse("CITROËN C4 1.2 PureTech", &reference_catalog());
    expect(&p, Some("Citroën"), Some("C4"), Some("1.2 PureTech"));
}

#[test]
fn brand_needs_word_boundary() {
    // "bmwx5" must not match the "bmw" brand key.
    let p = parse("BMWX5 xDrive", &reference_catalog());
    assert_eq!(p.method, ParseMethod::Heuristic);
    expect(&p, Some("BMWX5"), Some("xDrive"), None);
}

#[test]
fn punctuation_in_title() {
    let p = parse("BMW Serie-3 320d 140 kW (190 CV)", &reference_catalog());
    expect(&p, Some("BMW"), Some("Serie 3"), Some("320d 140 kW (190 CV)"));

    let p = parse("  opel   grandland-x  1.2 Turbo ", &reference_catalog());
    expect(&p, Some("OPEL"), Some("Grandland X"), Some("1.2 Turbo"));
}

#[test]
fn title_equal_to_brand() {
    let p = parse("Mercedes Benz", &reference_catalog());
    expect(&p, Some("Mercedes-Benz"), None, None);
    assert_eq!(p.confidence, 1.0);
    assert_eq!(p.method, ParseMethod::DbBrandOnly);
}

#[test]
fn parse_is_idempotent() {
    let catalog = reference_catalog();
    for title in [
        "OPEL Corsa 1.2",
        "Seat Leon FR",
        "Kia Ceed 1.6 CRDi",
        "Tesla Model Y Performance",
        "Land Rover",
        "",
    ] {
        assert_eq!(parse(title, &catalog), parse(title, &catalog), "title {title:?}");
    }
}

#[test]
fn normalization_is_symmetric() {
    let catalog = reference_catalog();
    for variant in ["SEAT LEÓN 1.5", "seat leon 1.5", "Seat León 1.5", "Seat-Leon 1.5"] {
        let p = parse(variant, &catalog);
        expect(&p, Some("SEAT"), Some("León"), Some("1.5"));
    }
    assert_eq!(normalize("Mercedes-Benz"), normalize("MERCEDES BENZ"));
    assert_eq!(normalize("Citroën"), normalize("citroen"));
}

#[test]
fn confidence_tiers_are_fixed() {
    let catalog = reference_catalog();
    let titles = [
        "OPEL Corsa 1.2",
        "OPEL Mokka-e",
        "Dacia Duster 1.5",
        "BMW",
        "Renault",
        "Peugeot 208 GT",
        "BMW X5 xDrive30d",
    ];
    for title in titles {
        let p = parse(title, &catalog);
        let expected: &[f64] = match p.method {
            ParseMethod::DbExact => &[1.0],
            ParseMethod::DbBrandOnly => &[0.7, 1.0],
            ParseMethod::Heuristic => &[0.5],
        };
        assert!(expected.contains(&p.confidence), "{title:?} -> {p:?}");
        if p.method == ParseMethod::DbBrandOnly && p.model.is_some() {
            assert_eq!(p.confidence, 0.7);
        }
    }
}

#[test]
fn parse_from_many_threads() {
    let catalog = Arc::new(reference_catalog());
    let expected = parse("BMW Serie 3 320d", &catalog);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || {
                (0..200)
                    .map(|_| parse("BMW Serie 3 320d", &catalog))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for p in handle.join().unwrap() {
            assert_eq!(p, expected);
        }
    }
}
