use pde_comm::LocalCluster;
use pde_persist::BinaryDataWriter;

/// Two ranks writing the same named block collectively must each get their
/// own `.cfbin` file, but the manifest written on rank 0 must describe both
/// ranks' blocks with their individually reported row counts.
#[test]
fn two_ranks_each_write_a_file_and_rank_zero_writes_one_manifest_for_both() {
    let dir = tempfile::tempdir().unwrap();
    let basename = dir.path().join("field");
    let cluster = LocalCluster::new(2);

    std::thread::scope(|scope| {
        for rank in 0..2 {
            let comm = cluster.comm(rank);
            let basename = basename.clone();
            scope.spawn(move || {
                let mut writer = BinaryDataWriter::create(&basename, &comm).unwrap();
                let rows = 10 + rank as u64;
                let payload = vec![rank as u8; 64];
                writer.write_data_block(&payload, "solution", rows, 1, "f64", &comm).unwrap();
                writer.close(&comm).unwrap();
            });
        }
    });

    assert!(dir.path().join("field_P0.cfbin").exists());
    assert!(dir.path().join("field_P1.cfbin").exists());

    let manifest = std::fs::read_to_string(basename.with_extension("cfbinxml")).unwrap();
    assert!(manifest.contains("nb_rows=\"10\""));
    assert!(manifest.contains("nb_rows=\"11\""));
    assert_eq!(manifest.matches("<node ").count(), 2);
}
