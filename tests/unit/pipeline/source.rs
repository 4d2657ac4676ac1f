use super::*;

#[test]
fn static_fetcher_serves_registered_bytes() {
    let f = StaticFetcher::new().with("logo.gif", vec![1, 2, 3]);
    assert_eq!(f.fetch("logo.gif").unwrap(), vec![1, 2, 3]);
    let err = f.fetch("other.gif").unwrap_err();
    assert!(matches!(err, StampError::Fetch(_)));
    assert!(err.to_string().starts_with("fetch error:"));
}

#[test]
fn file_fetcher_reads_relative_to_root() {
    let dir = std::env::temp_dir().join(format!("gifstamp-fetch-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.gif"), b"GIF89a").unwrap();

    let f = FileFetcher::with_root(&dir);
    assert_eq!(f.fetch("a.gif").unwrap(), b"GIF89a".to_vec());
    assert!(matches!(f.fetch("missing.gif"), Err(StampError::Fetch(_))));

    let abs = dir.join("a.gif");
    assert_eq!(
        FileFetcher::new().fetch(abs.to_str().unwrap()).unwrap(),
        b"GIF89a".to_vec()
    );
    std::fs::remove_dir_all(&dir).unwrap();
}
