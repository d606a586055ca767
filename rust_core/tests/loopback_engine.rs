use ndarray::{arr1, arr2, ArrayD, IxDyn};
use probgate_core::gateway::{Arg, RemoteValue};
use probgate_core::{
    BridgeError, Context, Element, ElementType, HostArray, LocalOverrides, ModelBuilder,
    RemoteObject, Series, Shape, Table, Tensor, Value, Vertex, VertexArg, VertexKind,
};

fn ctx() -> Context {
    Context::loopback(42)
}

fn gaussian(ctx: &Context, mu: impl Into<VertexArg>, sigma: impl Into<VertexArg>) -> Vertex {
    Vertex::new(ctx, VertexKind::Gaussian, [mu.into(), sigma.into()]).unwrap()
}

#[test]
fn booleans_are_not_integers() {
    let ctx = ctx();
    let t = Tensor::wrap(&ctx, true).unwrap();
    assert_eq!(t.element_type().unwrap(), ElementType::Boolean);
    let v = Vertex::constant(&ctx, true).unwrap();
    assert_eq!(v.kind().unwrap(), Some(VertexKind::ConstantBool));
}

#[test]
fn arrays_round_trip_through_the_engine() {
    let ctx = ctx();
    let arrays: Vec<HostArray> = vec![
        arr2(&[[1i64, 4], [5, 38]]).into_dyn().into(),
        arr1(&[0.5f64, -1.25, 3.0]).into_dyn().into(),
        arr2(&[[true, false, true]]).into_dyn().into(),
        ArrayD::from_shape_vec(IxDyn(&[2, 1, 3]), (0..6i64).collect::<Vec<i64>>()).unwrap().into(),
    ];
    for array in arrays {
        let t = Tensor::wrap(&ctx, array.clone()).unwrap();
        assert_eq!(t.to_local_array().unwrap(), array);
    }
}

#[test]
fn table_becomes_row_major_integer_tensor() {
    let ctx = ctx();
    let table = Table::from_columns(vec![
        ("A".into(), arr1(&[1i64, 3]).into_dyn().into()),
        ("B".into(), arr1(&[2i64, 4]).into_dyn().into()),
    ])
    .unwrap();
    let t = Tensor::wrap(&ctx, table).unwrap();
    assert_eq!(t.element_type().unwrap(), ElementType::Integer);
    assert_eq!(t.shape().unwrap(), Shape(vec![2, 2]));
    assert_eq!(
        t.to_local_array().unwrap(),
        HostArray::Integer(arr2(&[[1i64, 2], [3, 4]]).into_dyn())
    );
}

#[test]
fn empty_and_generic_arrays_are_rejected() {
    let ctx = ctx();
    let empty: Value = ArrayD::<f64>::zeros(IxDyn(&[0])).into();
    assert!(matches!(Tensor::wrap(&ctx, empty), Err(BridgeError::EmptyInput)));

    let generic = Value::List(vec![Element::Integer(1), Element::Other("<class 'str'>".into())]);
    let err = Tensor::wrap(&ctx, generic).unwrap_err();
    assert!(err.is_unsupported_type());
    assert!(err.to_string().contains("<class 'str'>"));
}

#[test]
fn constants_round_trip() {
    let ctx = ctx();
    let cases = [
        (Value::Integer(3), Element::Integer(3)),
        (Value::Double(3.4), Element::Double(3.4)),
        (Value::Boolean(true), Element::Boolean(true)),
    ];
    for (value, expected) in cases {
        let v = Vertex::constant(&ctx, value).unwrap();
        assert_eq!(v.get_value().unwrap().scalar().unwrap(), expected);
    }
}

#[test]
fn ids_follow_construction_order() {
    let ctx = ctx();
    let a = Vertex::constant(&ctx, 1.0).unwrap();
    let b = gaussian(&ctx, &a, 1.0);
    assert!(a.id().unwrap() < b.id().unwrap());
}

#[test]
fn connected_graph_counts_every_vertex_once() {
    let ctx = ctx();
    let mu = Vertex::constant(&ctx, 0.0).unwrap();
    // Two consumers of one constant.
    let x = gaussian(&ctx, &mu, 1.0);
    let y = gaussian(&ctx, &mu, 2.0);
    assert_eq!(x.connected_graph().unwrap().count().unwrap(), 5);
    assert_eq!(y.connected_graph().unwrap().count().unwrap(), 5);

    let lone = gaussian(&ctx, 0.0, 1.0);
    assert_eq!(lone.connected_graph().unwrap().count().unwrap(), 3);
}

#[test]
fn shaped_gaussian_samples_have_that_shape() {
    let ctx = ctx();
    let g = Vertex::new(
        &ctx,
        VertexKind::Gaussian,
        [VertexArg::from(Shape(vec![3, 3])), 0.0.into(), 1.0.into()],
    )
    .unwrap();
    let sample = g.sample().unwrap();
    assert_eq!(sample.shape().unwrap(), Shape(vec![3, 3]));
    assert_eq!(sample.element_type().unwrap(), ElementType::Double);
}

#[test]
fn array_parameters_set_the_sample_shape() {
    let ctx = ctx();
    let mu = arr2(&[[0.0f64, 10.0]]).into_dyn();
    let sigma = arr2(&[[1.0f64, 2.0]]).into_dyn();
    let g = Vertex::new(&ctx, VertexKind::Gaussian, [mu, sigma]).unwrap();
    assert_eq!(g.sample().unwrap().shape().unwrap(), Shape(vec![1, 2]));
}

#[test]
fn observed_array_is_the_value() {
    let ctx = ctx();
    let g = Vertex::new(
        &ctx,
        VertexKind::Gaussian,
        [arr2(&[[0.0f64, 0.0]]).into_dyn(), arr2(&[[1.0f64, 1.0]]).into_dyn()],
    )
    .unwrap();
    let observed = arr2(&[[0.5f64, -0.5]]).into_dyn();
    g.observe(observed.clone()).unwrap();
    assert!(g.is_observed().unwrap());
    assert_eq!(g.get_value().unwrap().to_local_array().unwrap(), HostArray::from(observed));
}

#[test]
fn series_constant_round_trips() {
    let ctx = ctx();
    let values: HostArray = arr1(&[1.0f64, 2.5, -3.0]).into_dyn().into();
    let v = Vertex::constant(&ctx, Series::new(values.clone())).unwrap();
    assert_eq!(v.get_value().unwrap().to_local_array().unwrap(), values);
}

#[test]
fn child_samples_follow_observed_parent() {
    let ctx = ctx();
    let mu = gaussian(&ctx, 0.0, 1.0);
    mu.observe(100.0).unwrap();
    let x = gaussian(&ctx, &mu, 0.001);
    for _ in 0..5 {
        let Element::Double(v) = x.sample().unwrap().scalar().unwrap() else {
            panic!("expected a double sample");
        };
        assert!((v - 100.0).abs() < 0.1, "sample {} ignored the observed parent", v);
    }
}

#[test]
fn sampling_is_reproducible_per_seed() {
    let draw = |seed| {
        let ctx = Context::loopback(seed);
        let g = gaussian(&ctx, 0.0, 1.0);
        g.sample().unwrap().scalar().unwrap()
    };
    assert_eq!(draw(7), draw(7));
}

#[test]
fn integer_distributions_produce_integers() {
    let ctx = ctx();
    let years = Vertex::new(&ctx, VertexKind::UniformInt, [1851i64, 1963]).unwrap();
    let Element::Integer(year) = years.sample().unwrap().scalar().unwrap() else {
        panic!("expected an integer sample");
    };
    assert!((1851..1963).contains(&year));
}

struct IndexOfOverride;

impl LocalOverrides for IndexOfOverride {
    fn call_local(
        &self,
        _: &RemoteObject,
        name: &str,
        _: &[Arg],
    ) -> Option<probgate_core::Result<RemoteValue>> {
        (name == "index_of").then(|| Ok(RemoteValue::Integer(-42)))
    }
}

#[test]
fn proxy_resolution_order() {
    let ctx = ctx();
    let list = RemoteObject::construct(&ctx, "java.util.ArrayList", &[]).unwrap();
    list.invoke("add", &[Arg::Integer(7)]).unwrap();

    // Remote name used from the host side fails, overridden or not.
    for name in ["isEmpty", "indexOf"] {
        assert!(matches!(
            list.dispatch(&IndexOfOverride, name, &[]),
            Err(BridgeError::NamingConvention { .. })
        ));
    }

    // snake_case forwards as camelCase.
    assert_eq!(list.invoke("is_empty", &[]).unwrap(), RemoteValue::Boolean(false));
    assert_eq!(list.invoke("get", &[Arg::Integer(0)]).unwrap(), RemoteValue::Integer(7));
    assert_eq!(
        list.invoke("index_of", &[Arg::Integer(7)]).unwrap(),
        RemoteValue::Integer(0)
    );

    // The override wins over the remote method.
    assert_eq!(
        list.dispatch(&IndexOfOverride, "index_of", &[Arg::Integer(7)]).unwrap(),
        RemoteValue::Integer(-42)
    );
}

#[test]
fn vertices_forward_unwrapped_methods() {
    let ctx = ctx();
    let g = gaussian(&ctx, 0.0, 1.0);
    assert_eq!(
        g.dispatch(&(), "is_probabilistic", &[]).unwrap(),
        RemoteValue::Boolean(true)
    );
}

#[test]
fn model_holds_named_vertices() {
    let ctx = ctx();
    let rate = Vertex::constant(&ctx, 2.0).unwrap();
    let model = ModelBuilder::new(&ctx)
        .add("rate", &rate)
        .unwrap()
        .add(
            "disasters",
            Vertex::new(&ctx, VertexKind::Poisson, [&rate]).unwrap(),
        )
        .unwrap()
        .build();
    assert_eq!(model.len(), 2);
    let disasters = model.get("disasters").unwrap();
    assert!(matches!(
        disasters.sample().unwrap().scalar().unwrap(),
        Element::Integer(n) if n >= 0
    ));
}
