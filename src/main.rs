//! Demo: two peers edit the same document concurrently, the transformer
//! rewrites the pair, and both application orders converge.

use weft_docop::{AnnotationBoundary, Attributes, AttributesUpdate, DocOpBuilder, Document};
use weft_transform::transform;

fn main() {
    let plain = Attributes::from_pairs([("style", "plain")]);
    let base = Document::from_attributes(vec![plain.clone(); 4]);

    // Client: bold the first item, annotate the first two with a comment.
    let mut client = DocOpBuilder::new();
    client.annotation_boundary(
        AnnotationBoundary::new().with_change("comment", None, Some("check this")),
    );
    client.replace_attributes(plain.clone(), Attributes::from_pairs([("style", "bold")]));
    client.retain(1);
    client.annotation_boundary(AnnotationBoundary::new().with_end("comment"));
    client.retain(2);
    let client_op = client.finish();

    // Server: concurrently bump the size of the first three items.
    let mut server = DocOpBuilder::new();
    let grow = AttributesUpdate::from_triples([("size", None::<&str>, Some("14"))]);
    server.update_attributes(grow.clone());
    server.update_attributes(grow.clone());
    server.update_attributes(grow);
    server.retain(1);
    let server_op = server.finish();

    let pair = transform(&client_op, &server_op).expect("transform failed");
    println!("client' = {:#?}", pair.client.components());
    println!("server' = {:#?}", pair.server.components());

    let via_server = base
        .apply(&server_op)
        .and_then(|doc| doc.apply(&pair.client))
        .expect("server-first application failed");
    let via_client = base
        .apply(&client_op)
        .and_then(|doc| doc.apply(&pair.server))
        .expect("client-first application failed");
    assert_eq!(via_server, via_client);

    println!("\nconverged document:");
    for (index, item) in via_server.items().iter().enumerate() {
        println!("  item {index}: {:?} {:?}", item.attributes, item.annotations);
    }
}
