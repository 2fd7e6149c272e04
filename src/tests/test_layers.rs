use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::DqnError;
use crate::estimator::Mode;
use crate::layers::{DenseLayer, DropoutLayer, LayerTrait, Sequential};

#[test]
fn test_activation_functions() {
    let mut inputs = array![[-1.0, 0.0, 2.0]];
    Activation::Relu.apply_batch(&mut inputs);
    assert_eq!(inputs, array![[0.0, 0.0, 2.0]]);

    let pre = array![[-1.0, 0.0, 2.0]];
    assert_eq!(Activation::Relu.derivative_batch(pre.view()), array![[0.0, 0.0, 1.0]]);
    assert_eq!(Activation::Linear.derivative_batch(pre.view()), array![[1.0, 1.0, 1.0]]);

    let mut linear = pre.clone();
    Activation::Linear.apply_batch(&mut linear);
    assert_eq!(linear, pre);
}

#[test]
fn test_dense_layer_initialization_bounds() {
    let layer = DenseLayer::new(16, 8, Activation::Relu, &mut StdRng::seed_from_u64(0));
    assert_eq!(layer.weights.dim(), (16, 8));
    assert_eq!(layer.biases.len(), 8);

    let bound = 1.0 / 4.0;
    assert!(layer.weights.iter().all(|w| w.abs() <= bound));
    assert!(layer.biases.iter().all(|b| b.abs() <= bound));
}

#[test]
fn test_dense_layer_forward() {
    let mut layer = DenseLayer::new(2, 2, Activation::Relu, &mut StdRng::seed_from_u64(0))
        .with_weights(array![[1.0, -1.0], [2.0, 0.5]])
        .unwrap()
        .with_biases(array![0.5, -3.0])
        .unwrap();

    let out = layer.forward_batch(array![[1.0, 1.0]].view(), Mode::Inference).unwrap();
    assert_eq!(out, array![[3.5, 0.0]]);
}

#[test]
fn test_dense_layer_rejects_bad_shapes() {
    let layer = DenseLayer::new(2, 3, Activation::Linear, &mut StdRng::seed_from_u64(0));
    assert!(matches!(
        layer.clone().with_weights(Array2::zeros((3, 2))),
        Err(DqnError::DimensionMismatch { .. })
    ));
    assert!(layer.clone().with_biases(array![1.0]).is_err());

    let mut layer = layer;
    assert!(layer.forward_batch(Array2::zeros((1, 4)).view(), Mode::Training).is_err());
}

#[test]
fn test_dense_layer_backward() {
    let mut layer = DenseLayer::new(2, 1, Activation::Linear, &mut StdRng::seed_from_u64(0))
        .with_weights(array![[2.0], [-1.0]])
        .unwrap();

    let inputs = array![[1.0, 3.0], [0.5, -1.0]];
    layer.forward_batch(inputs.view(), Mode::Training).unwrap();
    let input_grad = layer.backward_batch(array![[1.0], [2.0]].view()).unwrap();

    assert_eq!(input_grad, array![[2.0, -1.0], [4.0, -2.0]]);
    assert_eq!(layer.weight_grad(), &array![[2.0], [1.0]]);
    assert_eq!(layer.bias_grad(), &array![3.0]);

    // Gradients accumulate until zeroed
    layer.forward_batch(inputs.view(), Mode::Training).unwrap();
    layer.backward_batch(array![[1.0], [2.0]].view()).unwrap();
    assert_eq!(layer.bias_grad(), &array![6.0]);
}

#[test]
fn test_dense_layer_backward_requires_training_forward() {
    let mut layer = DenseLayer::new(2, 2, Activation::Relu, &mut StdRng::seed_from_u64(0));
    assert!(matches!(
        layer.backward_batch(Array2::ones((1, 2)).view()),
        Err(DqnError::TrainingError(_))
    ));

    layer.forward_batch(Array2::ones((1, 2)).view(), Mode::Inference).unwrap();
    assert!(layer.backward_batch(Array2::ones((1, 2)).view()).is_err());
}

#[test]
fn test_dropout_layer() {
    assert!(DropoutLayer::new(4, 1.0, 0).is_err());
    assert!(DropoutLayer::new(4, -0.1, 0).is_err());

    let mut layer = DropoutLayer::new(1000, 0.5, 42).unwrap();
    let inputs = Array2::ones((1, 1000));

    let inference = layer.forward_batch(inputs.view(), Mode::Inference).unwrap();
    assert_eq!(inference, inputs);

    let training = layer.forward_batch(inputs.view(), Mode::Training).unwrap();
    assert!(training.iter().all(|&v| v == 0.0 || v == 2.0));
    let kept = training.iter().filter(|&&v| v > 0.0).count();
    assert!((400..600).contains(&kept));

    // Backward routes gradients through the same mask
    let grad = layer.backward_batch(inputs.view()).unwrap();
    assert_eq!(grad, training);
    assert!(layer.parameters().is_empty());
}

#[test]
fn test_sequential_trunk_layout() {
    let mut rng = StdRng::seed_from_u64(0);
    let trunk = Sequential::relu_trunk(&[4, 8, 6], 0.0, &mut rng).unwrap();
    assert_eq!(trunk.len(), 2);
    assert_eq!(trunk.output_size(), Some(6));
    assert_eq!(trunk.parameters().len(), 4);

    let with_dropout = Sequential::relu_trunk(&[4, 8, 6], 0.2, &mut rng).unwrap();
    assert_eq!(with_dropout.len(), 4);
    assert_eq!(with_dropout.parameters().len(), 4);

    assert!(Sequential::relu_trunk(&[], 0.0, &mut rng).is_err());
    assert!(Sequential::new().output_size().is_none());
}

#[test]
fn test_sequential_forward_backward_shapes() {
    let mut trunk = Sequential::relu_trunk(&[3, 5, 4], 0.0, &mut StdRng::seed_from_u64(1)).unwrap();
    let out = trunk.forward_batch(Array2::ones((2, 3)).view(), Mode::Training).unwrap();
    assert_eq!(out.dim(), (2, 4));

    let input_grad = trunk.backward_batch(Array2::ones((2, 4)).view()).unwrap();
    assert_eq!(input_grad.dim(), (2, 3));
}
