use std::io::Cursor;
use std::sync::Arc;

use probgate_core::gateway::{RemoteHandle, TcpGateway};
use probgate_core::{
    sample, set_default_random_seed, BayesNet, Context, Conventions, Element, SampleConfig,
    Tensor, Vertex, VertexId,
};

type Scripted = TcpGateway<Cursor<Vec<u8>>, Vec<u8>>;

fn scripted(replies: &str) -> Arc<Scripted> {
    Arc::new(TcpGateway::from_parts(
        Cursor::new(replies.as_bytes().to_vec()),
        Vec::new(),
    ))
}

fn transcript(gateway: Arc<Scripted>) -> String {
    let gateway = Arc::try_unwrap(gateway).ok().expect("context still alive");
    let (_, sent) = gateway.into_parts();
    String::from_utf8(sent).unwrap()
}

#[test]
fn scalar_tensor_commands() {
    let gateway = scripted("!yro0\n!ybtrue\n!yro1\n!ysio.improbable.keanu.tensor.dbl.ScalarDoubleTensor\n!yd3.4\n");
    {
        let ctx = Context::new(gateway.clone(), Conventions::default());
        let t = Tensor::wrap(&ctx, 3.4).unwrap();
        assert_eq!(t.scalar().unwrap(), Element::Double(3.4));
    }
    assert_eq!(
        transcript(gateway),
        "c\nz:io.improbable.keanu.tensor.dbl.DoubleTensor\nscalar\nd3.4\ne\n\
         c\no0\nisScalar\ne\n\
         c\no0\ngetClass\ne\n\
         c\no1\ngetName\ne\n\
         c\no0\nscalar\ne\n"
    );
}

#[test]
fn constant_vertex_commands() {
    let gateway = scripted("!yro0\n!yro1\n");
    {
        let ctx = Context::new(gateway.clone(), Conventions::default());
        Vertex::constant(&ctx, 3i64).unwrap();
    }
    assert_eq!(
        transcript(gateway),
        "c\nz:io.improbable.keanu.tensor.intgr.IntegerTensor\nscalar\ni3\ne\n\
         i\nio.improbable.keanu.vertices.intgr.nonprobabilistic.ConstantIntegerVertex\nro0\ne\n"
    );
}

#[test]
fn remote_fault_propagates_unchanged() {
    let gateway = scripted("!xsjava.lang.IllegalArgumentException: sigma < 0\n");
    let ctx = Context::new(gateway, Conventions::default());
    let err = Tensor::wrap(&ctx, 1.0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "remote engine raised: java.lang.IllegalArgumentException: sigma < 0"
    );
}

#[test]
fn posterior_samples_are_keyed_by_vertex_id() {
    let replies = [
        // network over one vertex
        "!yro2", "!ybtrue", "!yro3",
        // sampler, vertex list, posterior, drop, down-sample
        "!yro4", "!yro5", "!ybtrue", "!yro6", "!yro7", "!yro8",
        // vertex id (7,)
        "!yro9", "!yto10", "!yi1", "!yL7",
        // draws for the vertex
        "!yro11", "!ylo12", "!ygo13",
        "!ybtrue", "!yro14", "!ybtrue", "!yro15", "!ybfalse",
    ]
    .join("\n")
        + "\n";
    let gateway = scripted(&replies);
    {
        let ctx = Context::new(gateway.clone(), Conventions::default());
        let switchpoint = Vertex::from_handle(&ctx, RemoteHandle::new("o1"));
        let net = BayesNet::new(&ctx, &[switchpoint.clone()]).unwrap();
        let config = SampleConfig {
            draws: 4,
            drop: 1,
            ..SampleConfig::default()
        };
        let samples = sample(&net, &[switchpoint], &config).unwrap();
        assert_eq!(samples.len(), 1);
        let draws = &samples[&VertexId(vec![7])];
        let handles: Vec<&str> = draws.iter().map(|t| t.handle().as_str()).collect();
        assert_eq!(handles, vec!["o14", "o15"]);
    }
    assert_eq!(
        transcript(gateway),
        "i\njava.util.ArrayList\ne\n\
         c\no2\nadd\nro1\ne\n\
         i\nio.improbable.keanu.network.BayesianNetwork\nro2\ne\n\
         c\nz:io.improbable.keanu.algorithms.mcmc.MetropolisHastings\nwithDefaultConfig\ne\n\
         i\njava.util.ArrayList\ne\n\
         c\no5\nadd\nro1\ne\n\
         c\no4\ngetPosteriorSamples\nro3\nro5\ni4\ne\n\
         c\no6\ndrop\ni1\ne\n\
         c\no7\ndownSample\ni1\ne\n\
         c\no1\ngetId\ne\n\
         c\no9\ngetValue\ne\n\
         a\ne\nro10\ne\n\
         a\ng\nro10\ni0\ne\n\
         c\no8\nget\nro1\ne\n\
         c\no11\nasList\ne\n\
         c\no12\niterator\ne\n\
         c\no13\nhasNext\ne\n\
         c\no13\nnext\ne\n\
         c\no13\nhasNext\ne\n\
         c\no13\nnext\ne\n\
         c\no13\nhasNext\ne\n"
    );
}

#[test]
fn random_seed_is_forwarded_as_long() {
    let gateway = scripted("!yv\n");
    {
        let ctx = Context::new(gateway.clone(), Conventions::default());
        set_default_random_seed(&ctx, 1).unwrap();
    }
    assert_eq!(
        transcript(gateway),
        "c\nz:io.improbable.keanu.vertices.dbl.KeanuRandom\nsetDefaultRandomSeed\nL1\ne\n"
    );
}
